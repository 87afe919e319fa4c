// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The compute invocation contract.
//!
//! Actual execution of user code (subprocess runtimes) lives outside
//! the core; the core sees only [`ComputeRunner`]. The engine owns the
//! function catalog and enforces each function's deadline: a runner
//! that hangs is cut off and the caller sees a timeout error.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lws_config::FunctionSpec;
use lws_core::{arn, EngineError, IdGen, UuidIdGen};
use serde_json::Value;

/// Per-invocation context handed to the runner.
#[derive(Debug, Clone)]
pub struct InvocationContext {
    pub function_name: String,
    pub request_id: String,
    pub invoked_function_arn: String,
    pub memory_limit_mb: u32,
    pub timeout: Duration,
}

/// Executes one invocation of a configured function.
#[async_trait]
pub trait ComputeRunner: Send + Sync {
    async fn run(
        &self,
        function: &FunctionSpec,
        event: Value,
        context: &InvocationContext,
    ) -> Result<Value, EngineError>;
}

/// Owns the function catalog and applies invocation deadlines.
pub struct ComputeEngine {
    functions: HashMap<String, FunctionSpec>,
    runner: Arc<dyn ComputeRunner>,
    ids: UuidIdGen,
}

impl ComputeEngine {
    pub fn new(functions: Vec<FunctionSpec>, runner: Arc<dyn ComputeRunner>) -> Self {
        let functions = functions.into_iter().map(|f| (f.name.clone(), f)).collect();
        Self { functions, runner, ids: UuidIdGen }
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn function_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.functions.keys().cloned().collect();
        names.sort();
        names
    }

    /// Invoke a function with an event payload. The configured timeout
    /// is an absolute deadline; on expiry the runner future is dropped
    /// and the caller gets a timeout error.
    pub async fn invoke(&self, name: &str, event: Value) -> Result<Value, EngineError> {
        let function = self
            .functions
            .get(name)
            .ok_or_else(|| EngineError::not_found("function", name))?;
        let context = InvocationContext {
            function_name: function.name.clone(),
            request_id: self.ids.next(),
            invoked_function_arn: arn::function(&function.name),
            memory_limit_mb: function.memory_mb,
            timeout: Duration::from_secs(function.timeout_secs),
        };
        match tokio::time::timeout(context.timeout, self.runner.run(function, event, &context))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(EngineError::Timeout(format!(
                "function {name} exceeded {}s",
                function.timeout_secs
            ))),
        }
    }
}

/// Test runner that records every invocation and replies with a canned
/// response (default `{}`), a configured failure, or a configured hang.
#[cfg(any(test, feature = "test-support"))]
pub struct RecordingRunner {
    invocations: parking_lot::Mutex<Vec<(String, Value)>>,
    responses: parking_lot::Mutex<HashMap<String, Value>>,
    failures: parking_lot::Mutex<std::collections::HashSet<String>>,
    hangs: parking_lot::Mutex<std::collections::HashSet<String>>,
    notify: tokio::sync::Notify,
}

#[cfg(any(test, feature = "test-support"))]
impl RecordingRunner {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            invocations: parking_lot::Mutex::new(Vec::new()),
            responses: parking_lot::Mutex::new(HashMap::new()),
            failures: parking_lot::Mutex::new(std::collections::HashSet::new()),
            hangs: parking_lot::Mutex::new(std::collections::HashSet::new()),
            notify: tokio::sync::Notify::new(),
        })
    }

    pub fn respond_with(&self, function: &str, response: Value) {
        self.responses.lock().insert(function.to_string(), response);
    }

    pub fn fail(&self, function: &str) {
        self.failures.lock().insert(function.to_string());
    }

    pub fn hang(&self, function: &str) {
        self.hangs.lock().insert(function.to_string());
    }

    /// Events recorded so far for a function, in invocation order.
    pub fn invocations_of(&self, function: &str) -> Vec<Value> {
        self.invocations
            .lock()
            .iter()
            .filter(|(name, _)| name == function)
            .map(|(_, event)| event.clone())
            .collect()
    }

    pub fn total_invocations(&self) -> usize {
        self.invocations.lock().len()
    }

    /// Wait until at least `count` invocations have been recorded.
    pub async fn wait_for(&self, count: usize, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.invocations.lock().len() >= count {
                return true;
            }
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                return false;
            }
            let _ = tokio::time::timeout(remaining, self.notify.notified()).await;
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
#[async_trait]
impl ComputeRunner for RecordingRunner {
    async fn run(
        &self,
        function: &FunctionSpec,
        event: Value,
        _context: &InvocationContext,
    ) -> Result<Value, EngineError> {
        if self.hangs.lock().contains(&function.name) {
            std::future::pending::<()>().await;
        }
        self.invocations.lock().push((function.name.clone(), event));
        self.notify.notify_waiters();
        if self.failures.lock().contains(&function.name) {
            return Err(EngineError::Internal(format!("{} failed", function.name)));
        }
        let canned = self.responses.lock().get(&function.name).cloned();
        Ok(canned.unwrap_or_else(|| Value::Object(serde_json::Map::new())))
    }
}

#[cfg(test)]
#[path = "compute_tests.rs"]
mod tests;
