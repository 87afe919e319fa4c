// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Table adapter: `X-Amz-Target: DynamoDB_20120810.*` over JSON.

use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Response;
use axum::routing::post;
use axum::Router;
use lws_core::{AttrValue, EngineError, Item};
use lws_engine::table::{ExprParams, TransactWriteOp};
use serde_json::{json, Value};

use super::{engine_error, json_response, wire_error};
use crate::state::ServerState;

const SERVICE: &str = "dynamodb";
const TARGET_PREFIX: &str = "DynamoDB_20120810.";

pub fn router(state: ServerState) -> Router {
    Router::new().route("/", post(dispatch)).with_state(state)
}

async fn dispatch(
    State(state): State<ServerState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(operation) = headers
        .get("x-amz-target")
        .and_then(|v| v.to_str().ok())
        .and_then(|t| t.strip_prefix(TARGET_PREFIX))
    else {
        return wire_error(SERVICE, "ValidationException", "missing X-Amz-Target");
    };
    let body: Value = serde_json::from_slice(&body).unwrap_or_else(|_| json!({}));
    match handle(&state, operation, &body) {
        Ok(response) => response,
        Err(err) => engine_error(SERVICE, &err),
    }
}

fn handle(state: &ServerState, operation: &str, body: &Value) -> Result<Response, EngineError> {
    let tables = &state.engines.tables;
    match operation {
        "PutItem" => {
            let item = parse_item(&body["Item"])?;
            tables.put(table_name(body)?, item)?;
            Ok(json_response(200, json!({})))
        }
        "GetItem" => {
            let key = parse_item(&body["Key"])?;
            let item = tables.get_item(table_name(body)?, &key)?;
            let mut result = json!({});
            if let Some(item) = item {
                result["Item"] = item_to_value(&item);
            }
            Ok(json_response(200, result))
        }
        "DeleteItem" => {
            let key = parse_item(&body["Key"])?;
            tables.delete_item(table_name(body)?, &key)?;
            Ok(json_response(200, json!({})))
        }
        "UpdateItem" => {
            let key = parse_item(&body["Key"])?;
            let update = body["UpdateExpression"].as_str().unwrap_or_default();
            let params = expr_params(body)?;
            let updated = tables.update_item(table_name(body)?, &key, update, &params)?;
            Ok(json_response(200, json!({ "Attributes": item_to_value(&updated) })))
        }
        "Query" => {
            let key_condition = body["KeyConditionExpression"].as_str().unwrap_or_default();
            let filter = body["FilterExpression"].as_str();
            let params = expr_params(body)?;
            let index = body["IndexName"].as_str();
            let items =
                tables.query(table_name(body)?, key_condition, filter, &params, index)?;
            Ok(items_response(&items))
        }
        "Scan" => {
            let filter = body["FilterExpression"].as_str();
            let params = expr_params(body)?;
            let items = tables.scan(table_name(body)?, filter, &params)?;
            Ok(items_response(&items))
        }
        "BatchGetItem" => handle_batch_get(state, body),
        "BatchWriteItem" => handle_batch_write(state, body),
        "TransactWriteItems" => handle_transact_write(state, body),
        "TransactGetItems" => handle_transact_get(state, body),
        "ListTables" => {
            Ok(json_response(200, json!({ "TableNames": tables.list_tables() })))
        }
        "DeleteTable" => {
            let name = table_name(body)?;
            tables.delete_table(name)?;
            Ok(json_response(200, json!({ "TableDescription": { "TableName": name } })))
        }
        other => Ok(wire_error(
            SERVICE,
            "ValidationException",
            &format!("unknown operation {other}"),
        )),
    }
}

fn handle_batch_get(state: &ServerState, body: &Value) -> Result<Response, EngineError> {
    let request_items = body["RequestItems"]
        .as_object()
        .ok_or_else(|| EngineError::validation("RequestItems must be a map"))?;
    let mut responses = serde_json::Map::new();
    for (table, request) in request_items {
        let keys: Vec<Item> = request["Keys"]
            .as_array()
            .map(|keys| keys.iter().map(parse_item).collect::<Result<_, _>>())
            .transpose()?
            .unwrap_or_default();
        let items = state.engines.tables.batch_get(table, &keys)?;
        responses.insert(
            table.clone(),
            Value::Array(items.iter().map(item_to_value).collect()),
        );
    }
    Ok(json_response(200, json!({ "Responses": responses })))
}

fn handle_batch_write(state: &ServerState, body: &Value) -> Result<Response, EngineError> {
    let request_items = body["RequestItems"]
        .as_object()
        .ok_or_else(|| EngineError::validation("RequestItems must be a map"))?;
    for (table, requests) in request_items {
        let requests = requests
            .as_array()
            .ok_or_else(|| EngineError::validation("write requests must be a list"))?;
        let mut puts = Vec::new();
        let mut deletes = Vec::new();
        for request in requests {
            if let Some(put) = request.get("PutRequest") {
                puts.push(parse_item(&put["Item"])?);
            } else if let Some(delete) = request.get("DeleteRequest") {
                deletes.push(parse_item(&delete["Key"])?);
            }
        }
        state.engines.tables.batch_write(table, puts, deletes)?;
    }
    Ok(json_response(200, json!({ "UnprocessedItems": {} })))
}

fn handle_transact_write(state: &ServerState, body: &Value) -> Result<Response, EngineError> {
    let transact_items = body["TransactItems"]
        .as_array()
        .ok_or_else(|| EngineError::validation("TransactItems must be a list"))?;
    let mut ops = Vec::with_capacity(transact_items.len());
    for entry in transact_items {
        ops.push(parse_transact_op(entry)?);
    }
    match state.engines.tables.transact_write(ops) {
        Ok(()) => Ok(json_response(200, json!({}))),
        Err(EngineError::TransactionCanceled { reasons }) => {
            let rendered: Vec<Value> = reasons
                .iter()
                .map(|reason| json!({ "Code": reason.code() }))
                .collect();
            Ok(json_response(
                400,
                json!({
                    "__type": "TransactionCanceledException",
                    "message": "Transaction cancelled, please refer cancellation reasons for specific reasons",
                    "CancellationReasons": rendered,
                }),
            ))
        }
        Err(err) => Err(err),
    }
}

fn handle_transact_get(state: &ServerState, body: &Value) -> Result<Response, EngineError> {
    let transact_items = body["TransactItems"]
        .as_array()
        .ok_or_else(|| EngineError::validation("TransactItems must be a list"))?;
    let mut gets = Vec::with_capacity(transact_items.len());
    for entry in transact_items {
        let get = entry
            .get("Get")
            .ok_or_else(|| EngineError::validation("transact get entries require Get"))?;
        let table = get["TableName"]
            .as_str()
            .ok_or_else(|| EngineError::validation("Get requires TableName"))?;
        gets.push((table.to_string(), parse_item(&get["Key"])?));
    }
    let results = state.engines.tables.transact_get(&gets)?;
    let responses: Vec<Value> = results
        .iter()
        .map(|item| match item {
            Some(item) => json!({ "Item": item_to_value(item) }),
            None => json!({}),
        })
        .collect();
    Ok(json_response(200, json!({ "Responses": responses })))
}

fn parse_transact_op(entry: &Value) -> Result<TransactWriteOp, EngineError> {
    if let Some(put) = entry.get("Put") {
        return Ok(TransactWriteOp::Put {
            table: required_table(put)?,
            item: parse_item(&put["Item"])?,
            condition: put["ConditionExpression"].as_str().map(str::to_string),
            params: expr_params(put)?,
        });
    }
    if let Some(update) = entry.get("Update") {
        return Ok(TransactWriteOp::Update {
            table: required_table(update)?,
            key: parse_item(&update["Key"])?,
            update: update["UpdateExpression"].as_str().unwrap_or_default().to_string(),
            condition: update["ConditionExpression"].as_str().map(str::to_string),
            params: expr_params(update)?,
        });
    }
    if let Some(delete) = entry.get("Delete") {
        return Ok(TransactWriteOp::Delete {
            table: required_table(delete)?,
            key: parse_item(&delete["Key"])?,
            condition: delete["ConditionExpression"].as_str().map(str::to_string),
            params: expr_params(delete)?,
        });
    }
    if let Some(check) = entry.get("ConditionCheck") {
        return Ok(TransactWriteOp::ConditionCheck {
            table: required_table(check)?,
            key: parse_item(&check["Key"])?,
            condition: check["ConditionExpression"].as_str().unwrap_or_default().to_string(),
            params: expr_params(check)?,
        });
    }
    Err(EngineError::validation("unsupported transact item"))
}

fn required_table(op: &Value) -> Result<String, EngineError> {
    op["TableName"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| EngineError::validation("TableName is required"))
}

fn table_name(body: &Value) -> Result<&str, EngineError> {
    body["TableName"]
        .as_str()
        .ok_or_else(|| EngineError::validation("TableName is required"))
}

fn parse_item(value: &Value) -> Result<Item, EngineError> {
    serde_json::from_value(value.clone())
        .map_err(|e| EngineError::validation(format!("malformed item: {e}")))
}

fn item_to_value(item: &Item) -> Value {
    serde_json::to_value(item).unwrap_or_else(|_| json!({}))
}

fn expr_params(body: &Value) -> Result<ExprParams, EngineError> {
    let names: Option<HashMap<String, String>> = match body.get("ExpressionAttributeNames") {
        Some(Value::Object(_)) => Some(
            serde_json::from_value(body["ExpressionAttributeNames"].clone())
                .map_err(|e| EngineError::validation(format!("malformed names: {e}")))?,
        ),
        _ => None,
    };
    let values: Option<HashMap<String, AttrValue>> =
        match body.get("ExpressionAttributeValues") {
            Some(Value::Object(_)) => Some(
                serde_json::from_value(body["ExpressionAttributeValues"].clone())
                    .map_err(|e| EngineError::validation(format!("malformed values: {e}")))?,
            ),
            _ => None,
        };
    Ok(ExprParams { names, values })
}

fn items_response(items: &[Item]) -> Response {
    json_response(
        200,
        json!({
            "Items": items.iter().map(item_to_value).collect::<Vec<Value>>(),
            "Count": items.len(),
        }),
    )
}

#[cfg(test)]
#[path = "table_tests.rs"]
mod tests;
