// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::{from_json, from_toml};

#[test]
fn empty_document_gets_defaults() {
    let config = from_toml("").unwrap();
    assert_eq!(config.global.log_level, "info");
    assert_eq!(config.global.consistency_delay_ms, 0);
    assert!(!config.global.strict);
    let sqs = config.service("sqs");
    assert!(sqs.enabled);
    assert_eq!(sqs.port, 4576);
    assert_eq!(config.identity.mode, "disabled");
}

#[test]
fn toml_queue_with_redrive() {
    let config = from_toml(
        r#"
[[queues]]
name = "orders-dlq"

[[queues]]
name = "orders"
visibility_timeout_secs = 5

[queues.redrive]
target = "orders-dlq"
max_receive_count = 3
"#,
    )
    .unwrap();
    assert_eq!(config.queues.len(), 2);
    let orders = &config.queues[1];
    assert_eq!(orders.visibility_timeout_secs, 5);
    let redrive = orders.redrive.as_ref().unwrap();
    assert_eq!(redrive.target, "orders-dlq");
    assert_eq!(redrive.max_receive_count, 3);
}

#[test]
fn toml_fifo_queue_defaults() {
    let config = from_toml(
        r#"
[[queues]]
name = "jobs.fifo"
fifo = true
content_based_dedup = true
"#,
    )
    .unwrap();
    let queue = &config.queues[0];
    assert!(queue.fifo);
    assert!(queue.content_based_dedup);
    assert_eq!(queue.visibility_timeout_secs, 30);
}

#[test]
fn json_table_with_stream_and_mapping() {
    let config = from_json(
        r#"{
            "tables": [{
                "name": "users",
                "partition_key": {"name": "id"},
                "stream_view": "new-and-old"
            }],
            "functions": [{"name": "audit"}],
            "event_source_mappings": [{
                "kind": "table-stream",
                "source": "users",
                "function": "audit",
                "batch_size": 25
            }]
        }"#,
    )
    .unwrap();
    let table = &config.tables[0];
    assert_eq!(table.partition_key.name, "id");
    assert_eq!(table.partition_key.attr_type, "S");
    assert_eq!(table.stream_view, Some(crate::StreamView::NewAndOld));
    assert_eq!(config.event_source_mappings[0].batch_size, 25);
}

#[test]
fn toml_bus_rule_with_pattern() {
    let config = from_toml(
        r#"
[[functions]]
name = "auditor"

[[buses]]
name = "default"

[[buses.rules]]
name = "order-events"
targets = ["auditor"]

[buses.rules.pattern]
source = ["app.orders"]
"#,
    )
    .unwrap();
    let rule = &config.buses[0].rules[0];
    assert!(rule.enabled);
    let pattern = rule.pattern.as_ref().unwrap();
    assert_eq!(pattern["source"][0], "app.orders");
}

#[test]
fn service_port_override() {
    let config = from_toml(
        r#"
[services.sqs]
port = 9320

[services.s3]
enabled = false
"#,
    )
    .unwrap();
    assert_eq!(config.service("sqs").port, 9320);
    assert!(!config.service("s3").enabled);
    assert_eq!(config.service("s3").port, 4572);
}

#[test]
fn unknown_field_is_rejected() {
    let err = from_toml("[[queues]]\nname = \"q\"\nvisibilty = 3\n").unwrap_err();
    assert!(err.to_string().contains("parse"), "{err}");
}
