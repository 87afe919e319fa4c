// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Filter-policy match specs.
//!
//! Shared by topic filter policies (flat attribute maps) and event-bus
//! patterns (structural): a leaf is a list of specs, and a value
//! matches the leaf iff at least one spec matches.

use serde_json::Value;

/// True iff any spec in the list matches the value (`None` = absent).
pub fn match_spec_list(specs: &[Value], actual: Option<&Value>) -> bool {
    specs.iter().any(|spec| match_spec(spec, actual))
}

/// Evaluate one match spec against an optional value.
pub fn match_spec(spec: &Value, actual: Option<&Value>) -> bool {
    match spec {
        // Exact scalar match
        Value::String(expected) => {
            actual.and_then(Value::as_str).is_some_and(|s| s == expected)
        }
        Value::Number(expected) => match actual {
            Some(value) => {
                as_number(value).zip(expected.as_f64()).is_some_and(|(a, b)| a == b)
            }
            None => false,
        },
        Value::Bool(expected) => actual.and_then(Value::as_bool) == Some(*expected),
        Value::Object(map) => {
            if let Some(exists) = map.get("exists").and_then(Value::as_bool) {
                return exists == actual.is_some();
            }
            let Some(value) = actual else {
                return false;
            };
            if let Some(prefix) = map.get("prefix").and_then(Value::as_str) {
                return value.as_str().is_some_and(|s| s.starts_with(prefix));
            }
            if let Some(suffix) = map.get("suffix").and_then(Value::as_str) {
                return value.as_str().is_some_and(|s| s.ends_with(suffix));
            }
            if let Some(excluded) = map.get("anything-but") {
                return match excluded {
                    Value::Array(set) => !set.iter().any(|e| json_equal(e, value)),
                    single => !json_equal(single, value),
                };
            }
            if let Some(ops) = map.get("numeric").and_then(Value::as_array) {
                return match_numeric(ops, value);
            }
            false
        }
        _ => false,
    }
}

/// `[">", 0, "<=", 100]`-style op/operand pairs, all of which must
/// hold.
fn match_numeric(ops: &[Value], actual: &Value) -> bool {
    let Some(actual) = as_number(actual) else {
        return false;
    };
    let mut pairs = ops.chunks(2);
    if ops.is_empty() || ops.len() % 2 != 0 {
        return false;
    }
    pairs.all(|pair| {
        let op = pair[0].as_str().unwrap_or_default();
        let Some(operand) = pair[1].as_f64() else {
            return false;
        };
        match op {
            "=" => actual == operand,
            "!=" => actual != operand,
            "<" => actual < operand,
            "<=" => actual <= operand,
            ">" => actual > operand,
            ">=" => actual >= operand,
            _ => false,
        }
    })
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        // Message attributes carry numbers as strings.
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn json_equal(expected: &Value, actual: &Value) -> bool {
    if let (Some(a), Some(b)) = (as_number(expected), as_number(actual)) {
        return a == b;
    }
    expected == actual
}

#[cfg(test)]
#[path = "filter_tests.rs"]
mod tests;
