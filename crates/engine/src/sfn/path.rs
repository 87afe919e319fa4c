// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSONPath subset for state input/output processing.
//!
//! Paths are `$`, dotted fields, and `[N]` indexes, the forms state
//! definitions actually use. Values travel input-path → parameters →
//! result-path → output-path, in that order, at every state.

use lws_core::EngineError;
use serde_json::{json, Value};

/// A path field that distinguishes absent from explicit `null`.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum PathField {
    #[default]
    Absent,
    Null,
    Path(String),
}

impl<'de> serde::Deserialize<'de> for PathField {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Ok(match Option::<String>::deserialize(deserializer)? {
            Some(path) => PathField::Path(path),
            None => PathField::Null,
        })
    }
}

/// Resolve a path against a value. `$` is the whole value; a miss is
/// `None`.
pub fn get_path(value: &Value, path: &str) -> Option<Value> {
    let mut current = value;
    for segment in segments(path)? {
        current = match segment {
            Segment::Field(name) => current.get(name)?,
            Segment::Index(i) => current.get(i)?,
        };
    }
    Some(current.clone())
}

/// Input-path / output-path application: absent means `$`, explicit
/// null discards (empty object), a path projects.
pub fn apply_path(value: &Value, path: &PathField) -> Value {
    match path {
        PathField::Absent => value.clone(),
        PathField::Null => json!({}),
        PathField::Path(path) => get_path(value, path).unwrap_or(Value::Null),
    }
}

/// Parameters templating: keys ending in `.$` are replaced by the
/// value at the named path, resolved against the input (`$...`) or the
/// context object (`$$...`).
pub fn apply_parameters(
    template: &Value,
    input: &Value,
    context: &Value,
) -> Result<Value, EngineError> {
    match template {
        Value::Object(map) => {
            let mut out = serde_json::Map::new();
            for (key, value) in map {
                if let Some(bare) = key.strip_suffix(".$") {
                    let Value::String(path) = value else {
                        return Err(EngineError::validation(format!(
                            "parameter {key} must name a path"
                        )));
                    };
                    let resolved = if let Some(context_path) = path.strip_prefix("$$") {
                        get_path(context, &format!("${context_path}"))
                    } else {
                        get_path(input, path)
                    };
                    let resolved = resolved.ok_or_else(|| {
                        EngineError::validation(format!("path {path} not found for {key}"))
                    })?;
                    out.insert(bare.to_string(), resolved);
                } else {
                    out.insert(key.clone(), apply_parameters(value, input, context)?);
                }
            }
            Ok(Value::Object(out))
        }
        Value::Array(items) => items
            .iter()
            .map(|item| apply_parameters(item, input, context))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        other => Ok(other.clone()),
    }
}

/// Result-path application: absent means the result replaces the
/// input, null discards the result, a path merges the result into the
/// input at that position (creating intermediate objects).
pub fn apply_result_path(
    input: Value,
    result: Value,
    path: &PathField,
) -> Result<Value, EngineError> {
    match path {
        PathField::Absent => Ok(result),
        PathField::Null => Ok(input),
        PathField::Path(path) => {
            let mut merged = input;
            set_path(&mut merged, path, result)?;
            Ok(merged)
        }
    }
}

fn set_path(target: &mut Value, path: &str, value: Value) -> Result<(), EngineError> {
    let segments = segments(path)
        .ok_or_else(|| EngineError::validation(format!("invalid result path {path}")))?;
    if segments.is_empty() {
        *target = value;
        return Ok(());
    }
    let mut current = target;
    for (i, segment) in segments.iter().enumerate() {
        let Segment::Field(name) = segment else {
            return Err(EngineError::validation("result paths may not index arrays"));
        };
        if !current.is_object() {
            *current = json!({});
        }
        let map = match current.as_object_mut() {
            Some(map) => map,
            None => return Err(EngineError::Internal("object coercion failed".to_string())),
        };
        if i == segments.len() - 1 {
            map.insert((*name).to_string(), value);
            return Ok(());
        }
        current = map.entry((*name).to_string()).or_insert_with(|| json!({}));
    }
    Ok(())
}

enum Segment<'a> {
    Field(&'a str),
    Index(usize),
}

/// `$.a.b[0]` → `[Field(a), Field(b), Index(0)]`; `$` → `[]`.
fn segments(path: &str) -> Option<Vec<Segment<'_>>> {
    let rest = path.strip_prefix('$')?;
    let mut out = Vec::new();
    for part in rest.split('.') {
        if part.is_empty() {
            continue;
        }
        let mut remainder = part;
        // Field name up to the first bracket
        if let Some(bracket) = remainder.find('[') {
            let (field, indexes) = remainder.split_at(bracket);
            if !field.is_empty() {
                out.push(Segment::Field(field));
            }
            remainder = indexes;
            while let Some(stripped) = remainder.strip_prefix('[') {
                let close = stripped.find(']')?;
                let index: usize = stripped[..close].parse().ok()?;
                out.push(Segment::Index(index));
                remainder = &stripped[close + 1..];
            }
            if !remainder.is_empty() {
                return None;
            }
        } else {
            out.push(Segment::Field(remainder));
        }
    }
    Some(out)
}

#[cfg(test)]
#[path = "path_tests.rs"]
mod tests;
