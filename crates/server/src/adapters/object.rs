// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Object-store adapter: REST-over-path with XML envelopes.

use std::collections::HashMap;

use axum::body::{Body, Bytes};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::Response;
use axum::routing::{any, get};
use axum::Router;
use lws_core::iso8601_ms;
use lws_engine::object::PutObjectRequest;
use lws_wire::{parse_tagging, Xml};

use super::engine_error;
use crate::state::ServerState;

const SERVICE: &str = "s3";

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/", get(list_buckets))
        .route("/:bucket", any(bucket_dispatch))
        .route("/:bucket/*key", any(object_dispatch))
        .with_state(state)
}

async fn list_buckets(State(state): State<ServerState>) -> Response {
    let buckets = state
        .engines
        .objects
        .list_buckets()
        .into_iter()
        .map(|name| Xml::new("Bucket").child(Xml::text("Name", name)));
    let doc = Xml::new("ListAllMyBucketsResult")
        .child(Xml::new("Buckets").children(buckets))
        .render();
    xml(StatusCode::OK, doc)
}

async fn bucket_dispatch(
    State(state): State<ServerState>,
    Path(bucket): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    method: Method,
    body: Bytes,
) -> Response {
    let objects = &state.engines.objects;

    // Subresources selected by a bare query key.
    if query.contains_key("tagging") {
        return bucket_tagging(&state, &bucket, &method, &body);
    }
    if query.contains_key("policy") {
        return bucket_policy(&state, &bucket, &method, &body);
    }
    if query.contains_key("notification") {
        return bucket_notification(&state, &bucket, &method, &body);
    }

    match method {
        Method::PUT => match objects.create_bucket(&bucket) {
            Ok(()) => empty(StatusCode::OK),
            Err(err) => engine_error(SERVICE, &err),
        },
        Method::DELETE => match objects.delete_bucket(&bucket) {
            Ok(()) => empty(StatusCode::NO_CONTENT),
            Err(err) => engine_error(SERVICE, &err),
        },
        Method::HEAD => match objects.head_bucket(&bucket) {
            Ok(_) => empty(StatusCode::OK),
            // HEAD responses carry no body.
            Err(_) => empty(StatusCode::NOT_FOUND),
        },
        Method::GET => list_objects(&state, &bucket, query.get("prefix").map(String::as_str)),
        _ => empty(StatusCode::METHOD_NOT_ALLOWED),
    }
}

fn list_objects(state: &ServerState, bucket: &str, prefix: Option<&str>) -> Response {
    let prefix = prefix.unwrap_or_default();
    match state.engines.objects.list_objects(bucket, prefix) {
        Ok(listed) => {
            let contents = listed.iter().map(|object| {
                Xml::new("Contents")
                    .child(Xml::text("Key", &object.key))
                    .child(Xml::text("Size", object.size.to_string()))
                    .child(Xml::text("ETag", format!("\"{}\"", object.etag)))
                    .child(Xml::text("LastModified", iso8601_ms(object.last_modified_ms)))
            });
            let doc = Xml::new("ListBucketResult")
                .child(Xml::text("Name", bucket))
                .child(Xml::text("Prefix", prefix))
                .child(Xml::text("KeyCount", listed.len().to_string()))
                .children(contents)
                .render();
            xml(StatusCode::OK, doc)
        }
        Err(err) => engine_error(SERVICE, &err),
    }
}

fn bucket_tagging(
    state: &ServerState,
    bucket: &str,
    method: &Method,
    body: &[u8],
) -> Response {
    let objects = &state.engines.objects;
    match *method {
        Method::PUT => {
            let tags = parse_tagging(&String::from_utf8_lossy(body)).into_iter().collect();
            match objects.put_bucket_tagging(bucket, tags) {
                Ok(()) => empty(StatusCode::OK),
                Err(err) => engine_error(SERVICE, &err),
            }
        }
        Method::GET => match objects.get_bucket_tagging(bucket) {
            Ok(tags) => {
                let mut sorted: Vec<_> = tags.into_iter().collect();
                sorted.sort();
                let rendered = sorted.into_iter().map(|(key, value)| {
                    Xml::new("Tag")
                        .child(Xml::text("Key", key))
                        .child(Xml::text("Value", value))
                });
                let doc = Xml::new("Tagging")
                    .child(Xml::new("TagSet").children(rendered))
                    .render();
                xml(StatusCode::OK, doc)
            }
            Err(err) => engine_error(SERVICE, &err),
        },
        Method::DELETE => match objects.delete_bucket_tagging(bucket) {
            Ok(()) => empty(StatusCode::NO_CONTENT),
            Err(err) => engine_error(SERVICE, &err),
        },
        _ => empty(StatusCode::METHOD_NOT_ALLOWED),
    }
}

fn bucket_policy(state: &ServerState, bucket: &str, method: &Method, body: &[u8]) -> Response {
    let objects = &state.engines.objects;
    match *method {
        Method::PUT => {
            let policy = String::from_utf8_lossy(body).into_owned();
            match objects.put_bucket_policy(bucket, policy) {
                Ok(()) => empty(StatusCode::OK),
                Err(err) => engine_error(SERVICE, &err),
            }
        }
        Method::GET => match objects.get_bucket_policy(bucket) {
            Ok(policy) => Response::builder()
                .status(StatusCode::OK)
                .header("content-type", "application/json")
                .body(Body::from(policy))
                .unwrap_or_else(|_| Response::new(Body::empty())),
            Err(err) => engine_error(SERVICE, &err),
        },
        _ => empty(StatusCode::METHOD_NOT_ALLOWED),
    }
}

fn bucket_notification(
    state: &ServerState,
    bucket: &str,
    method: &Method,
    body: &[u8],
) -> Response {
    let objects = &state.engines.objects;
    match *method {
        Method::PUT => {
            let config = String::from_utf8_lossy(body).into_owned();
            match objects.put_notification_configuration(bucket, config) {
                Ok(()) => empty(StatusCode::OK),
                Err(err) => engine_error(SERVICE, &err),
            }
        }
        Method::GET => match objects.get_notification_configuration(bucket) {
            Ok(config) => xml(StatusCode::OK, config),
            Err(err) => engine_error(SERVICE, &err),
        },
        _ => empty(StatusCode::METHOD_NOT_ALLOWED),
    }
}

async fn object_dispatch(
    State(state): State<ServerState>,
    Path((bucket, key)): Path<(String, String)>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let objects = &state.engines.objects;
    match method {
        Method::PUT => {
            if let Some(source) = headers.get("x-amz-copy-source").and_then(|v| v.to_str().ok())
            {
                let source = source.trim_start_matches('/');
                let Some((source_bucket, source_key)) = source.split_once('/') else {
                    return engine_error(
                        SERVICE,
                        &lws_core::EngineError::validation("malformed copy source"),
                    );
                };
                return match objects.copy_object(source_bucket, source_key, &bucket, &key) {
                    Ok(etag) => {
                        let doc = Xml::new("CopyObjectResult")
                            .child(Xml::text("ETag", format!("\"{etag}\"")))
                            .render();
                        xml(StatusCode::OK, doc)
                    }
                    Err(err) => engine_error(SERVICE, &err),
                };
            }
            let content_type = headers
                .get("content-type")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let stored_headers = headers
                .iter()
                .filter(|(name, _)| name.as_str().starts_with("x-amz-meta-"))
                .filter_map(|(name, value)| {
                    value.to_str().ok().map(|v| (name.to_string(), v.to_string()))
                })
                .collect();
            let request = PutObjectRequest {
                body: body.to_vec(),
                content_type,
                headers: stored_headers,
                tags: HashMap::new(),
            };
            match objects.put_object(&bucket, &key, request) {
                Ok(etag) => Response::builder()
                    .status(StatusCode::OK)
                    .header("etag", format!("\"{etag}\""))
                    .body(Body::empty())
                    .unwrap_or_else(|_| Response::new(Body::empty())),
                Err(err) => engine_error(SERVICE, &err),
            }
        }
        Method::GET => match objects.get_object(&bucket, &key) {
            Ok(object) => {
                let mut builder = Response::builder()
                    .status(StatusCode::OK)
                    .header("etag", format!("\"{}\"", object.etag))
                    .header("content-length", object.body.len());
                if let Some(content_type) = &object.content_type {
                    builder = builder.header("content-type", content_type.clone());
                }
                builder
                    .body(Body::from(object.body))
                    .unwrap_or_else(|_| Response::new(Body::empty()))
            }
            Err(err) => engine_error(SERVICE, &err),
        },
        Method::HEAD => match objects.head_object(&bucket, &key) {
            Ok(head) => Response::builder()
                .status(StatusCode::OK)
                .header("etag", format!("\"{}\"", head.etag))
                .header("content-length", head.size)
                .body(Body::empty())
                .unwrap_or_else(|_| Response::new(Body::empty())),
            Err(_) => empty(StatusCode::NOT_FOUND),
        },
        Method::DELETE => match objects.delete_object(&bucket, &key) {
            Ok(()) => empty(StatusCode::NO_CONTENT),
            Err(err) => engine_error(SERVICE, &err),
        },
        _ => empty(StatusCode::METHOD_NOT_ALLOWED),
    }
}

fn xml(status: StatusCode, body: String) -> Response {
    Response::builder()
        .status(status)
        .header("content-type", "application/xml")
        .body(Body::from(body))
        .unwrap_or_else(|_| Response::new(Body::empty()))
}

fn empty(status: StatusCode) -> Response {
    Response::builder()
        .status(status)
        .body(Body::empty())
        .unwrap_or_else(|_| Response::new(Body::empty()))
}

#[cfg(test)]
#[path = "object_tests.rs"]
mod tests;
