// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! State machines end to end: express sync runs and task wiring into
//! compute.

use std::sync::Arc;
use std::time::Duration;

use lws_config::WorkflowType;
use lws_core::FakeClock;
use lws_engine::sfn::{ExecOptions, ExecutionStatus, StateMachineEngine};
use lws_engine::{ComputeEngine, RecordingRunner};
use serde_json::json;

use crate::prelude::*;

fn machine_engine(functions: &[&str]) -> (StateMachineEngine<FakeClock>, Arc<RecordingRunner>) {
    let runner = RecordingRunner::new();
    let compute = Arc::new(ComputeEngine::new(
        functions.iter().map(|name| function(name)).collect(),
        runner.clone(),
    ));
    let engine = StateMachineEngine::new(
        FakeClock::new(),
        compute,
        ExecOptions { wait_ceiling: Some(Duration::from_millis(1)) },
    );
    (engine, runner)
}

#[tokio::test]
async fn express_sync_pass_state_returns_output() {
    let (engine, _) = machine_engine(&[]);
    engine
        .create_state_machine(
            "greeter",
            WorkflowType::Express,
            &json!({
                "StartAt": "P",
                "States": {
                    "P": { "Type": "Pass", "Result": {"greeting": "hello"}, "End": true }
                }
            }),
        )
        .unwrap();

    let execution = engine.start_sync_execution("greeter", json!({}), None).await.unwrap();
    assert_eq!(execution.status, ExecutionStatus::Succeeded);
    assert_eq!(execution.output, Some(json!({"greeting": "hello"})));
}

#[tokio::test]
async fn task_states_invoke_compute_and_thread_results() {
    let (engine, runner) = machine_engine(&["enrich"]);
    runner.respond_with("enrich", json!({"enriched": true}));
    engine
        .create_state_machine(
            "pipeline",
            WorkflowType::Express,
            &json!({
                "StartAt": "Enrich",
                "States": {
                    "Enrich": {
                        "Type": "Task",
                        "Resource": "enrich",
                        "ResultPath": "$.result",
                        "Next": "Check"
                    },
                    "Check": {
                        "Type": "Choice",
                        "Choices": [{
                            "Variable": "$.result.enriched",
                            "BooleanEquals": true,
                            "Next": "Done"
                        }],
                        "Default": "Failed"
                    },
                    "Done": { "Type": "Succeed" },
                    "Failed": { "Type": "Fail", "Error": "NotEnriched" }
                }
            }),
        )
        .unwrap();

    let execution = engine
        .start_sync_execution("pipeline", json!({"order": 7}), None)
        .await
        .unwrap();
    assert_eq!(execution.status, ExecutionStatus::Succeeded);
    let output = execution.output.unwrap();
    assert_eq!(output["order"], 7);
    assert_eq!(output["result"]["enriched"], true);
    assert_eq!(runner.invocations_of("enrich"), vec![json!({"order": 7})]);
}

#[tokio::test]
async fn deterministic_machines_are_pure_functions_of_input() {
    let (engine, _) = machine_engine(&[]);
    engine
        .create_state_machine(
            "pure",
            WorkflowType::Express,
            &json!({
                "StartAt": "W",
                "States": {
                    "W": { "Type": "Wait", "Seconds": 0, "Next": "C" },
                    "C": {
                        "Type": "Choice",
                        "Choices": [
                            { "Variable": "$.n", "NumericGreaterThan": 0, "Next": "Pos" }
                        ],
                        "Default": "NonPos"
                    },
                    "Pos": { "Type": "Pass", "Result": "positive", "End": true },
                    "NonPos": { "Type": "Pass", "Result": "non-positive", "End": true }
                }
            }),
        )
        .unwrap();

    for _ in 0..3 {
        let execution =
            engine.start_sync_execution("pure", json!({"n": 2}), None).await.unwrap();
        assert_eq!(execution.output, Some(json!("positive")));
    }
    let execution = engine.start_sync_execution("pure", json!({"n": 0}), None).await.unwrap();
    assert_eq!(execution.output, Some(json!("non-positive")));
}
