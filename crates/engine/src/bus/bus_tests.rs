// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::compute::{ComputeEngine, RecordingRunner};
use crate::queue::QueueEngine;
use lws_config::FunctionSpec;
use lws_core::FakeClock;
use std::time::Duration;

struct Rig {
    bus: Arc<BusEngine<FakeClock>>,
    runner: Arc<RecordingRunner>,
}

fn rig() -> Rig {
    let clock = FakeClock::new();
    let queues = Arc::new(QueueEngine::new(clock.clone()));
    let runner = RecordingRunner::new();
    let compute = Arc::new(ComputeEngine::new(
        vec![
            FunctionSpec {
                name: "auditor".to_string(),
                runtime: "nodejs20.x".to_string(),
                handler: "index.handler".to_string(),
                timeout_secs: 5,
                memory_mb: 128,
                env: HashMap::new(),
            },
            FunctionSpec {
                name: "notifier".to_string(),
                runtime: "nodejs20.x".to_string(),
                handler: "index.handler".to_string(),
                timeout_secs: 5,
                memory_mb: 128,
                env: HashMap::new(),
            },
        ],
        runner.clone(),
    ));
    let fabric = Fabric::new(queues, compute);
    Rig { bus: Arc::new(BusEngine::new(clock, fabric)), runner }
}

fn order_rule(name: &str, targets: &[&str]) -> RuleSpec {
    RuleSpec {
        name: name.to_string(),
        pattern: Some(serde_json::json!({"source": ["app.orders"]})),
        schedule: None,
        enabled: true,
        targets: targets.iter().map(|t| t.to_string()).collect(),
    }
}

fn order_entry() -> PutEventsEntry {
    PutEventsEntry {
        source: "app.orders".to_string(),
        detail_type: "OrderPlaced".to_string(),
        detail: r#"{"total": 42}"#.to_string(),
        bus_name: None,
    }
}

#[test]
fn default_bus_always_exists() {
    let rig = rig();
    assert_eq!(rig.bus.list_buses(), ["default"]);
    let (_, bus_arn) = rig.bus.describe_bus("default").unwrap();
    assert_eq!(bus_arn, "arn:aws:events:us-east-1:000000000000:event-bus/default");
    assert!(matches!(
        rig.bus.delete_bus("default").unwrap_err(),
        EngineError::Validation(_)
    ));
}

#[test]
fn create_bus_is_idempotent() {
    let rig = rig();
    let first = rig.bus.create_bus("orders");
    let second = rig.bus.create_bus("orders");
    assert_eq!(first, second);
    rig.bus.delete_bus("orders").unwrap();
    assert!(rig.bus.delete_bus("orders").unwrap_err().is_not_found());
}

#[tokio::test]
async fn matching_rule_dispatches_targets() {
    let rig = rig();
    rig.bus.put_rule("default", order_rule("audit", &["auditor"])).unwrap();

    rig.bus.put_events(vec![order_entry()]);
    assert!(rig.runner.wait_for(1, Duration::from_secs(2)).await);

    let event = rig.runner.invocations_of("auditor").remove(0);
    assert_eq!(event["source"], "app.orders");
    assert_eq!(event["detail-type"], "OrderPlaced");
    assert_eq!(event["detail"]["total"], 42);
    assert_eq!(event["version"], "0");
    assert_eq!(event["account"], "000000000000");
}

#[tokio::test]
async fn non_matching_and_disabled_rules_do_not_fire() {
    let rig = rig();
    let mut disabled = order_rule("off", &["auditor"]);
    disabled.enabled = false;
    rig.bus.put_rule("default", disabled).unwrap();
    rig.bus
        .put_rule(
            "default",
            RuleSpec {
                name: "billing-only".to_string(),
                pattern: Some(serde_json::json!({"source": ["app.billing"]})),
                schedule: None,
                enabled: true,
                targets: vec!["auditor".to_string()],
            },
        )
        .unwrap();

    rig.bus.put_events(vec![order_entry()]);
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
    assert_eq!(rig.runner.total_invocations(), 0);
}

#[tokio::test]
async fn rule_without_pattern_never_routes_events() {
    let rig = rig();
    rig.bus
        .put_rule(
            "default",
            RuleSpec {
                name: "schedule-only".to_string(),
                pattern: None,
                schedule: Some("rate(1 hour)".to_string()),
                enabled: true,
                targets: vec!["auditor".to_string()],
            },
        )
        .unwrap();
    rig.bus.put_events(vec![order_entry()]);
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
    assert_eq!(rig.runner.total_invocations(), 0);
}

#[tokio::test]
async fn rule_targets_fan_out_and_failures_are_isolated() {
    let rig = rig();
    rig.runner.fail("auditor");
    rig.bus
        .put_rule("default", order_rule("fan", &["auditor", "notifier"]))
        .unwrap();

    rig.bus.put_events(vec![order_entry()]);
    assert!(rig.runner.wait_for(2, Duration::from_secs(2)).await);
    assert_eq!(rig.runner.invocations_of("notifier").len(), 1);
}

#[test]
fn every_entry_gets_an_event_id() {
    let rig = rig();
    let results = rig.bus.put_events(vec![order_entry(), order_entry()]);
    assert_eq!(results.len(), 2);
    assert_ne!(results[0].event_id, results[1].event_id);
}

#[test]
fn put_rule_validates_schedule() {
    let rig = rig();
    let err = rig
        .bus
        .put_rule(
            "default",
            RuleSpec {
                name: "bad".to_string(),
                pattern: None,
                schedule: Some("rate(soon)".to_string()),
                enabled: true,
                targets: vec![],
            },
        )
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[test]
fn rules_can_be_listed_and_deleted() {
    let rig = rig();
    rig.bus.put_rule("default", order_rule("a", &["auditor"])).unwrap();
    assert_eq!(rig.bus.list_rules("default").unwrap().len(), 1);
    rig.bus.delete_rule("default", "a").unwrap();
    assert!(rig.bus.list_rules("default").unwrap().is_empty());
    assert!(rig.bus.delete_rule("default", "a").unwrap_err().is_not_found());
}

#[tokio::test(start_paused = true)]
async fn scheduled_rule_fires_periodically() {
    let rig = rig();
    rig.bus
        .put_rule(
            "default",
            RuleSpec {
                name: "tick".to_string(),
                pattern: None,
                schedule: Some("rate(30 seconds)".to_string()),
                enabled: true,
                targets: vec!["auditor".to_string()],
            },
        )
        .unwrap();

    let cancel = CancellationToken::new();
    let handles = rig.bus.clone().start_scheduler(cancel.clone());
    assert_eq!(handles.len(), 1);

    tokio::time::sleep(Duration::from_secs(95)).await;
    assert!(rig.runner.wait_for(3, Duration::from_secs(1)).await);

    let event = rig.runner.invocations_of("auditor").remove(0);
    assert_eq!(event["detail-type"], "Scheduled Event");
    assert_eq!(event["source"], "aws.events");
    assert_eq!(
        event["resources"][0],
        "arn:aws:events:us-east-1:000000000000:rule/tick"
    );

    cancel.cancel();
    for handle in handles {
        let _ = handle.await;
    }
}
