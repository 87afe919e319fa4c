// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transactional writes leave no partial state behind.

use lws_config::{KeyAttributeSpec, TableSpec};
use lws_core::{CancellationReason, EngineError, FakeClock};
use lws_engine::table::{ExprParams, StreamDispatcher, TableEngine, TransactWriteOp};

use crate::prelude::*;

fn table_engine() -> TableEngine<FakeClock> {
    TableEngine::from_config(
        &[TableSpec {
            name: "T".to_string(),
            partition_key: KeyAttributeSpec {
                name: "pk".to_string(),
                attr_type: "S".to_string(),
            },
            sort_key: None,
            indexes: vec![],
            stream_view: None,
        }],
        FakeClock::new(),
        StreamDispatcher::with_defaults(),
    )
}

#[test]
fn failing_condition_check_cancels_the_whole_batch() {
    let tables = table_engine();

    let err = tables
        .transact_write(vec![
            TransactWriteOp::ConditionCheck {
                table: "T".to_string(),
                key: item(&[("pk", AttrValue::s("exists"))]),
                condition: "attribute_exists(pk)".to_string(),
                params: ExprParams::default(),
            },
            TransactWriteOp::Put {
                table: "T".to_string(),
                item: item(&[("pk", AttrValue::s("new-item"))]),
                condition: None,
                params: ExprParams::default(),
            },
        ])
        .unwrap_err();

    match err {
        EngineError::TransactionCanceled { reasons } => {
            assert_eq!(
                reasons,
                [CancellationReason::ConditionalCheckFailed, CancellationReason::None]
            );
        }
        other => panic!("expected cancellation, got {other}"),
    }

    // The put at index 1 never happened.
    let after = tables
        .get_item("T", &item(&[("pk", AttrValue::s("new-item"))]))
        .unwrap();
    assert!(after.is_none());
}

#[test]
fn all_passing_transaction_commits_every_write() {
    let tables = table_engine();
    tables.put("T", item(&[("pk", AttrValue::s("exists"))])).unwrap();

    tables
        .transact_write(vec![
            TransactWriteOp::ConditionCheck {
                table: "T".to_string(),
                key: item(&[("pk", AttrValue::s("exists"))]),
                condition: "attribute_exists(pk)".to_string(),
                params: ExprParams::default(),
            },
            TransactWriteOp::Put {
                table: "T".to_string(),
                item: item(&[("pk", AttrValue::s("a"))]),
                condition: None,
                params: ExprParams::default(),
            },
            TransactWriteOp::Delete {
                table: "T".to_string(),
                key: item(&[("pk", AttrValue::s("exists"))]),
                condition: None,
                params: ExprParams::default(),
            },
        ])
        .unwrap();

    assert!(tables.get_item("T", &item(&[("pk", AttrValue::s("a"))])).unwrap().is_some());
    assert!(tables.get_item("T", &item(&[("pk", AttrValue::s("exists"))])).unwrap().is_none());
}
