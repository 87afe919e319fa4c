// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[test]
fn queue_arn_shape() {
    assert_eq!(queue("orders"), "arn:aws:sqs:us-east-1:000000000000:orders");
}

#[test]
fn table_stream_arn_extends_table_arn() {
    assert_eq!(
        table_stream("users"),
        "arn:aws:dynamodb:us-east-1:000000000000:table/users/stream"
    );
}

#[test]
fn execution_arn_carries_machine_and_name() {
    assert_eq!(
        execution("checkout", "run-1"),
        "arn:aws:states:us-east-1:000000000000:execution:checkout:run-1"
    );
}

#[test]
fn parameter_arn_strips_leading_slash() {
    assert_eq!(
        parameter("/app/db/host"),
        "arn:aws:ssm:us-east-1:000000000000:parameter/app/db/host"
    );
}

#[parameterized(
    full_arn = { "arn:aws:lambda:us-east-1:000000000000:function:handler", "handler" },
    bare_name = { "handler", "handler" },
    queue_arn = { "arn:aws:sqs:us-east-1:000000000000:orders", "orders" },
)]
fn leaf_name_extracts_last_segment(input: &str, expected: &str) {
    assert_eq!(leaf_name(input), expected);
}
