// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! State-language definition model (the subset the emulator runs).

use std::collections::HashMap;

use lws_core::EngineError;
use serde::Deserialize;
use serde_json::Value;

use super::path::PathField;

/// Error name matching any error in Retry/Catch catalogs.
pub const ERROR_WILDCARD: &str = "States.ALL";

#[derive(Debug, Clone, Deserialize)]
pub struct Definition {
    #[serde(rename = "StartAt")]
    pub start_at: String,
    #[serde(rename = "States")]
    pub states: HashMap<String, State>,
    #[serde(rename = "Comment", default)]
    pub comment: Option<String>,
    #[serde(rename = "TimeoutSeconds", default)]
    pub timeout_seconds: Option<u64>,
}

impl Definition {
    /// Parse and structurally validate a definition document.
    pub fn parse(document: &Value) -> Result<Self, EngineError> {
        let definition: Definition = serde_json::from_value(document.clone())
            .map_err(|e| EngineError::validation(format!("invalid definition: {e}")))?;
        definition.validate()?;
        Ok(definition)
    }

    fn validate(&self) -> Result<(), EngineError> {
        if !self.states.contains_key(&self.start_at) {
            return Err(EngineError::validation(format!(
                "StartAt names unknown state '{}'",
                self.start_at
            )));
        }
        for (name, state) in &self.states {
            for next in state.transitions() {
                if !self.states.contains_key(next) {
                    return Err(EngineError::validation(format!(
                        "state '{name}' transitions to unknown state '{next}'"
                    )));
                }
            }
            if let State::Parallel(parallel) = state {
                for branch in &parallel.branches {
                    branch.validate()?;
                }
            }
            if let State::Map(map) = state {
                map.iterator()?.validate()?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "Type")]
pub enum State {
    Pass(PassState),
    Task(TaskState),
    Choice(ChoiceState),
    Wait(WaitState),
    Parallel(ParallelState),
    Map(MapState),
    Succeed(SucceedState),
    Fail(FailState),
}

impl State {
    /// Every state name this state can transition to.
    fn transitions(&self) -> Vec<&str> {
        let mut next: Vec<&str> = Vec::new();
        match self {
            State::Pass(s) => next.extend(s.next.as_deref()),
            State::Task(s) => {
                next.extend(s.next.as_deref());
                next.extend(s.catch.iter().map(|c| c.next.as_str()));
            }
            State::Choice(s) => {
                next.extend(s.choices.iter().filter_map(|c| c.next.as_deref()));
                next.extend(s.default.as_deref());
            }
            State::Wait(s) => next.extend(s.next.as_deref()),
            State::Parallel(s) => {
                next.extend(s.next.as_deref());
                next.extend(s.catch.iter().map(|c| c.next.as_str()));
            }
            State::Map(s) => {
                next.extend(s.next.as_deref());
                next.extend(s.catch.iter().map(|c| c.next.as_str()));
            }
            State::Succeed(_) | State::Fail(_) => {}
        }
        next
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PassState {
    #[serde(rename = "Result", default)]
    pub result: Option<Value>,
    #[serde(rename = "Parameters", default)]
    pub parameters: Option<Value>,
    #[serde(rename = "InputPath", default)]
    pub input_path: PathField,
    #[serde(rename = "ResultPath", default)]
    pub result_path: PathField,
    #[serde(rename = "OutputPath", default)]
    pub output_path: PathField,
    #[serde(rename = "Next", default)]
    pub next: Option<String>,
    #[serde(rename = "End", default)]
    pub end: bool,
    #[serde(rename = "Comment", default)]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaskState {
    #[serde(rename = "Resource")]
    pub resource: String,
    #[serde(rename = "Parameters", default)]
    pub parameters: Option<Value>,
    #[serde(rename = "InputPath", default)]
    pub input_path: PathField,
    #[serde(rename = "ResultPath", default)]
    pub result_path: PathField,
    #[serde(rename = "OutputPath", default)]
    pub output_path: PathField,
    #[serde(rename = "TimeoutSeconds", default)]
    pub timeout_seconds: Option<u64>,
    #[serde(rename = "Retry", default)]
    pub retry: Vec<RetrySpec>,
    #[serde(rename = "Catch", default)]
    pub catch: Vec<CatchSpec>,
    #[serde(rename = "Next", default)]
    pub next: Option<String>,
    #[serde(rename = "End", default)]
    pub end: bool,
    #[serde(rename = "Comment", default)]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetrySpec {
    #[serde(rename = "ErrorEquals")]
    pub error_equals: Vec<String>,
    #[serde(rename = "IntervalSeconds", default = "default_interval")]
    pub interval_seconds: u64,
    #[serde(rename = "MaxAttempts", default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(rename = "BackoffRate", default = "default_backoff")]
    pub backoff_rate: f64,
}

fn default_interval() -> u64 {
    1
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff() -> f64 {
    2.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatchSpec {
    #[serde(rename = "ErrorEquals")]
    pub error_equals: Vec<String>,
    #[serde(rename = "ResultPath", default)]
    pub result_path: PathField,
    #[serde(rename = "Next")]
    pub next: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChoiceState {
    #[serde(rename = "Choices")]
    pub choices: Vec<ChoiceRule>,
    #[serde(rename = "Default", default)]
    pub default: Option<String>,
    #[serde(rename = "InputPath", default)]
    pub input_path: PathField,
    #[serde(rename = "OutputPath", default)]
    pub output_path: PathField,
    #[serde(rename = "Comment", default)]
    pub comment: Option<String>,
}

/// One choice rule: a comparison or combinator, with `Next` at the top
/// level only.
#[derive(Debug, Clone, Deserialize)]
pub struct ChoiceRule {
    #[serde(rename = "Variable", default)]
    pub variable: Option<String>,
    #[serde(rename = "And", default)]
    pub and: Option<Vec<ChoiceRule>>,
    #[serde(rename = "Or", default)]
    pub or: Option<Vec<ChoiceRule>>,
    #[serde(rename = "Not", default)]
    pub not: Option<Box<ChoiceRule>>,

    #[serde(rename = "StringEquals", default)]
    pub string_equals: Option<String>,
    #[serde(rename = "StringLessThan", default)]
    pub string_less_than: Option<String>,
    #[serde(rename = "StringGreaterThan", default)]
    pub string_greater_than: Option<String>,
    #[serde(rename = "StringLessThanEquals", default)]
    pub string_less_than_equals: Option<String>,
    #[serde(rename = "StringGreaterThanEquals", default)]
    pub string_greater_than_equals: Option<String>,

    #[serde(rename = "NumericEquals", default)]
    pub numeric_equals: Option<f64>,
    #[serde(rename = "NumericLessThan", default)]
    pub numeric_less_than: Option<f64>,
    #[serde(rename = "NumericGreaterThan", default)]
    pub numeric_greater_than: Option<f64>,
    #[serde(rename = "NumericLessThanEquals", default)]
    pub numeric_less_than_equals: Option<f64>,
    #[serde(rename = "NumericGreaterThanEquals", default)]
    pub numeric_greater_than_equals: Option<f64>,

    #[serde(rename = "BooleanEquals", default)]
    pub boolean_equals: Option<bool>,
    #[serde(rename = "IsPresent", default)]
    pub is_present: Option<bool>,
    #[serde(rename = "IsNull", default)]
    pub is_null: Option<bool>,
    #[serde(rename = "IsNumeric", default)]
    pub is_numeric: Option<bool>,
    #[serde(rename = "IsString", default)]
    pub is_string: Option<bool>,
    #[serde(rename = "IsBoolean", default)]
    pub is_boolean: Option<bool>,

    #[serde(rename = "Next", default)]
    pub next: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WaitState {
    #[serde(rename = "Seconds", default)]
    pub seconds: Option<u64>,
    #[serde(rename = "SecondsPath", default)]
    pub seconds_path: Option<String>,
    #[serde(rename = "Timestamp", default)]
    pub timestamp: Option<String>,
    #[serde(rename = "TimestampPath", default)]
    pub timestamp_path: Option<String>,
    #[serde(rename = "InputPath", default)]
    pub input_path: PathField,
    #[serde(rename = "OutputPath", default)]
    pub output_path: PathField,
    #[serde(rename = "Next", default)]
    pub next: Option<String>,
    #[serde(rename = "End", default)]
    pub end: bool,
    #[serde(rename = "Comment", default)]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParallelState {
    #[serde(rename = "Branches")]
    pub branches: Vec<Definition>,
    #[serde(rename = "InputPath", default)]
    pub input_path: PathField,
    #[serde(rename = "ResultPath", default)]
    pub result_path: PathField,
    #[serde(rename = "OutputPath", default)]
    pub output_path: PathField,
    #[serde(rename = "Retry", default)]
    pub retry: Vec<RetrySpec>,
    #[serde(rename = "Catch", default)]
    pub catch: Vec<CatchSpec>,
    #[serde(rename = "Next", default)]
    pub next: Option<String>,
    #[serde(rename = "End", default)]
    pub end: bool,
    #[serde(rename = "Comment", default)]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MapState {
    #[serde(rename = "ItemsPath", default)]
    pub items_path: Option<String>,
    /// The older `Iterator` and newer `ItemProcessor` spellings are
    /// both accepted.
    #[serde(rename = "Iterator", default)]
    pub iterator_field: Option<Box<Definition>>,
    #[serde(rename = "ItemProcessor", default)]
    pub item_processor: Option<Box<Definition>>,
    #[serde(rename = "MaxConcurrency", default)]
    pub max_concurrency: Option<usize>,
    #[serde(rename = "Parameters", default)]
    pub parameters: Option<Value>,
    #[serde(rename = "InputPath", default)]
    pub input_path: PathField,
    #[serde(rename = "ResultPath", default)]
    pub result_path: PathField,
    #[serde(rename = "OutputPath", default)]
    pub output_path: PathField,
    #[serde(rename = "Retry", default)]
    pub retry: Vec<RetrySpec>,
    #[serde(rename = "Catch", default)]
    pub catch: Vec<CatchSpec>,
    #[serde(rename = "Next", default)]
    pub next: Option<String>,
    #[serde(rename = "End", default)]
    pub end: bool,
    #[serde(rename = "Comment", default)]
    pub comment: Option<String>,
}

impl MapState {
    pub fn iterator(&self) -> Result<&Definition, EngineError> {
        self.item_processor
            .as_deref()
            .or(self.iterator_field.as_deref())
            .ok_or_else(|| EngineError::validation("Map state requires an Iterator"))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SucceedState {
    #[serde(rename = "InputPath", default)]
    pub input_path: PathField,
    #[serde(rename = "OutputPath", default)]
    pub output_path: PathField,
    #[serde(rename = "Comment", default)]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FailState {
    #[serde(rename = "Error", default)]
    pub error: Option<String>,
    #[serde(rename = "Cause", default)]
    pub cause: Option<String>,
    #[serde(rename = "Comment", default)]
    pub comment: Option<String>,
}
