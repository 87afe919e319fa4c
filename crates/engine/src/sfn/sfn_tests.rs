// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::compute::{ComputeEngine, RecordingRunner};
use lws_core::FakeClock;
use serde_json::json;

fn engine() -> StateMachineEngine<FakeClock> {
    let compute = Arc::new(ComputeEngine::new(vec![], RecordingRunner::new()));
    StateMachineEngine::new(
        FakeClock::new(),
        compute,
        ExecOptions { wait_ceiling: Some(Duration::from_millis(1)) },
    )
}

fn greeting_definition() -> Value {
    json!({
        "StartAt": "P",
        "States": {
            "P": { "Type": "Pass", "Result": {"greeting": "hello"}, "End": true }
        }
    })
}

#[tokio::test]
async fn express_sync_execution_returns_output() {
    let engine = engine();
    engine
        .create_state_machine("greeter", WorkflowType::Express, &greeting_definition())
        .unwrap();

    let execution = engine
        .start_sync_execution("greeter", json!({}), None)
        .await
        .unwrap();
    assert_eq!(execution.status, ExecutionStatus::Succeeded);
    assert_eq!(execution.output, Some(json!({"greeting": "hello"})));
    assert!(execution.end_epoch_ms.is_some());
}

#[tokio::test]
async fn sync_execution_rejects_standard_workflows() {
    let engine = engine();
    engine
        .create_state_machine("std", WorkflowType::Standard, &greeting_definition())
        .unwrap();
    let err = engine.start_sync_execution("std", json!({}), None).await.unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn standard_execution_runs_in_background() {
    let engine = engine();
    engine
        .create_state_machine("std", WorkflowType::Standard, &greeting_definition())
        .unwrap();

    let execution_arn = engine.start_execution("std", json!({}), None).unwrap();
    assert!(execution_arn.starts_with("arn:aws:states:"));

    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        let execution = engine.describe_execution(&execution_arn).unwrap();
        if execution.status != ExecutionStatus::Running {
            assert_eq!(execution.status, ExecutionStatus::Succeeded);
            assert_eq!(execution.output, Some(json!({"greeting": "hello"})));
            break;
        }
        assert!(tokio::time::Instant::now() < deadline, "execution never finished");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

#[tokio::test]
async fn failed_execution_records_error_and_cause() {
    let engine = engine();
    engine
        .create_state_machine(
            "failer",
            WorkflowType::Express,
            &json!({
                "StartAt": "F",
                "States": {
                    "F": { "Type": "Fail", "Error": "Oops", "Cause": "bad input" }
                }
            }),
        )
        .unwrap();
    let execution = engine.start_sync_execution("failer", json!({}), None).await.unwrap();
    assert_eq!(execution.status, ExecutionStatus::Failed);
    assert_eq!(execution.error.as_deref(), Some("Oops"));
    assert_eq!(execution.cause.as_deref(), Some("bad input"));
}

#[tokio::test]
async fn list_executions_filters_by_machine_and_orders_recent_first() {
    let engine = engine();
    engine
        .create_state_machine("a", WorkflowType::Express, &greeting_definition())
        .unwrap();
    engine
        .create_state_machine("b", WorkflowType::Express, &greeting_definition())
        .unwrap();

    engine.start_sync_execution("a", json!({}), Some("first".to_string())).await.unwrap();
    engine.start_sync_execution("a", json!({}), Some("second".to_string())).await.unwrap();
    engine.start_sync_execution("b", json!({}), Some("other".to_string())).await.unwrap();

    let listed = engine.list_executions(Some("a"));
    let names: Vec<&str> = listed.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["second", "first"]);
    assert_eq!(engine.list_executions(None).len(), 3);
}

#[tokio::test]
async fn duplicate_execution_name_is_rejected() {
    let engine = engine();
    engine
        .create_state_machine("a", WorkflowType::Express, &greeting_definition())
        .unwrap();
    engine.start_sync_execution("a", json!({}), Some("run-1".to_string())).await.unwrap();
    let err = engine
        .start_sync_execution("a", json!({}), Some("run-1".to_string()))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::AlreadyExists { .. }));
}

#[test]
fn machine_lookup_errors() {
    let engine = engine();
    assert!(engine.start_execution("ghost", json!({}), None).unwrap_err().is_not_found());
    assert!(engine.describe_execution("arn:missing").unwrap_err().is_not_found());
    let err = engine
        .create_state_machine("bad", WorkflowType::Standard, &json!({"StartAt": "X"}))
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[test]
fn list_state_machines_reports_arns() {
    let engine = engine();
    engine
        .create_state_machine("zeta", WorkflowType::Standard, &greeting_definition())
        .unwrap();
    engine
        .create_state_machine("alpha", WorkflowType::Express, &greeting_definition())
        .unwrap();
    let machines = engine.list_state_machines();
    assert_eq!(machines[0].0, "alpha");
    assert_eq!(machines[1].1, "arn:aws:states:us-east-1:000000000000:stateMachine:zeta");
}

#[tokio::test(start_paused = true)]
async fn definition_timeout_marks_timed_out() {
    let runner = RecordingRunner::new();
    runner.hang("slow");
    let compute = Arc::new(ComputeEngine::new(
        vec![lws_config::FunctionSpec {
            name: "slow".to_string(),
            runtime: "nodejs20.x".to_string(),
            handler: "index.handler".to_string(),
            timeout_secs: 600,
            memory_mb: 128,
            env: std::collections::HashMap::new(),
        }],
        runner,
    ));
    let engine = StateMachineEngine::new(FakeClock::new(), compute, ExecOptions::default());
    engine
        .create_state_machine(
            "stuck",
            WorkflowType::Express,
            &json!({
                "StartAt": "T",
                "TimeoutSeconds": 2,
                "States": {
                    "T": { "Type": "Task", "Resource": "slow", "End": true }
                }
            }),
        )
        .unwrap();
    let execution = engine.start_sync_execution("stuck", json!({}), None).await.unwrap();
    assert_eq!(execution.status, ExecutionStatus::TimedOut);
    assert_eq!(execution.error.as_deref(), Some("States.Timeout"));
}
