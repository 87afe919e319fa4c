// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event-pattern matching.
//!
//! A pattern mirrors the envelope's structure; leaves are spec lists
//! evaluated with the same ops as topic filter policies (plus
//! `suffix`). An event matches iff every leaf list is satisfied at the
//! corresponding position.

use serde_json::Value;

use crate::topic::filter;

/// Structural match of an event against a pattern.
pub fn match_pattern(pattern: &Value, event: &Value) -> bool {
    let Value::Object(pattern) = pattern else {
        return false;
    };
    pattern.iter().all(|(key, expected)| {
        let actual = event.get(key);
        match expected {
            Value::Object(_) => match actual {
                Some(nested) => match_pattern(expected, nested),
                None => false,
            },
            Value::Array(specs) => filter::match_spec_list(specs, actual),
            single => filter::match_spec_list(std::slice::from_ref(single), actual),
        }
    })
}

#[cfg(test)]
#[path = "pattern_tests.rs"]
mod tests;
