// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Default compute runner.
//!
//! Subprocess runtimes plug in behind [`lws_engine::ComputeRunner`];
//! out of the box the daemon runs with this stand-in, which logs the
//! invocation and answers with an empty object the way a trivial
//! handler would.

use async_trait::async_trait;
use lws_config::FunctionSpec;
use lws_core::EngineError;
use lws_engine::{ComputeRunner, InvocationContext};
use serde_json::Value;

#[derive(Default)]
pub struct LoggingRunner;

#[async_trait]
impl ComputeRunner for LoggingRunner {
    async fn run(
        &self,
        function: &FunctionSpec,
        event: Value,
        context: &InvocationContext,
    ) -> Result<Value, EngineError> {
        tracing::info!(
            function = %function.name,
            request_id = %context.request_id,
            event = %event,
            "compute invocation (no runtime attached)"
        );
        Ok(Value::Object(serde_json::Map::new()))
    }
}
