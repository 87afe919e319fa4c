// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed attribute values.
//!
//! Table items, key-value images, and message attributes all move
//! across the wire as single-entry maps whose key names the type
//! (`{"S": "abc"}`, `{"N": "42"}`, `{"BOOL": true}`). The
//! externally-tagged serde representation of [`AttrValue`] produces
//! that form directly.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A typed attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttrValue {
    /// String
    S(String),
    /// Number, transported as a string
    N(String),
    /// Boolean
    #[serde(rename = "BOOL")]
    Bool(bool),
    /// Null (the payload is always `true` on the wire)
    #[serde(rename = "NULL")]
    Null(bool),
    /// List
    L(Vec<AttrValue>),
    /// Map
    M(IndexMap<String, AttrValue>),
}

/// An item: attribute name → typed value, insertion-ordered.
pub type Item = IndexMap<String, AttrValue>;

impl AttrValue {
    pub fn s(value: impl Into<String>) -> Self {
        AttrValue::S(value.into())
    }

    pub fn n(value: impl ToString) -> Self {
        AttrValue::N(value.to_string())
    }

    pub fn null() -> Self {
        AttrValue::Null(true)
    }

    pub fn as_s(&self) -> Option<&str> {
        match self {
            AttrValue::S(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view; `N` values that fail to parse yield `None`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttrValue::N(n) => n.parse().ok(),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            AttrValue::S(_) => "S",
            AttrValue::N(_) => "N",
            AttrValue::Bool(_) => "BOOL",
            AttrValue::Null(_) => "NULL",
            AttrValue::L(_) => "L",
            AttrValue::M(_) => "M",
        }
    }
}

/// A message attribute as queues and topics carry it
/// (`{"DataType": "String", "StringValue": "green"}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageAttr {
    #[serde(rename = "DataType")]
    pub data_type: String,
    #[serde(rename = "StringValue", skip_serializing_if = "Option::is_none")]
    pub string_value: Option<String>,
}

impl MessageAttr {
    pub fn string(value: impl Into<String>) -> Self {
        Self { data_type: "String".to_string(), string_value: Some(value.into()) }
    }

    pub fn number(value: impl Into<String>) -> Self {
        Self { data_type: "Number".to_string(), string_value: Some(value.into()) }
    }
}

#[cfg(test)]
#[path = "value_tests.rs"]
mod tests;
