// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::{from_toml, ConfigError};

#[test]
fn redrive_cycle_is_rejected() {
    let err = from_toml(
        r#"
[[queues]]
name = "a"
[queues.redrive]
target = "b"

[[queues]]
name = "b"
[queues.redrive]
target = "a"
"#,
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::RedriveCycle(_)), "{err}");
}

#[test]
fn self_redrive_is_rejected() {
    let err = from_toml(
        r#"
[[queues]]
name = "a"
[queues.redrive]
target = "a"
"#,
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::RedriveCycle(_)), "{err}");
}

#[test]
fn redrive_chain_without_cycle_passes() {
    from_toml(
        r#"
[[queues]]
name = "a"
[queues.redrive]
target = "b"

[[queues]]
name = "b"
[queues.redrive]
target = "c"

[[queues]]
name = "c"
"#,
    )
    .unwrap();
}

#[test]
fn redrive_unknown_target_is_rejected() {
    let err = from_toml(
        r#"
[[queues]]
name = "a"
[queues.redrive]
target = "missing"
"#,
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::UnknownReference { .. }), "{err}");
}

#[test]
fn fifo_name_mismatch_is_rejected() {
    let err = from_toml("[[queues]]\nname = \"jobs\"\nfifo = true\n").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { .. }), "{err}");

    let err = from_toml("[[queues]]\nname = \"jobs.fifo\"\n").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { .. }), "{err}");
}

#[test]
fn duplicate_queue_name_is_rejected() {
    let err = from_toml("[[queues]]\nname = \"q\"\n\n[[queues]]\nname = \"q\"\n").unwrap_err();
    assert!(matches!(err, ConfigError::Duplicate { resource: "queue", .. }), "{err}");
}

#[test]
fn mapping_to_unknown_function_is_rejected() {
    let err = from_toml(
        r#"
[[queues]]
name = "q"

[[event_source_mappings]]
kind = "queue"
source = "q"
function = "missing"
"#,
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::UnknownReference { resource: "function", .. }), "{err}");
}

#[test]
fn port_collision_is_rejected() {
    let err = from_toml(
        r#"
[services.sqs]
port = 9000

[services.sns]
port = 9000
"#,
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { .. }), "{err}");
}

#[test]
fn bad_schedule_expression_is_rejected() {
    let err = from_toml(
        r#"
[[functions]]
name = "f"

[[buses]]
name = "default"

[[buses.rules]]
name = "tick"
schedule = "every 5 minutes"
targets = ["f"]
"#,
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { .. }), "{err}");
}

#[test]
fn subscription_protocol_is_checked() {
    let err = from_toml(
        r#"
[[topics]]
name = "t"

[[topics.subscriptions]]
protocol = "email"
endpoint = "a@b.c"
"#,
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { .. }), "{err}");
}

#[test]
fn bad_identity_mode_is_rejected() {
    let err = from_toml("[identity]\nmode = \"paranoid\"\n").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { .. }), "{err}");
}
