// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The cross-service dispatch fabric.
//!
//! Holds engine handles, never engine state. Endpoints are resolved by
//! name at each dispatch, so resources created or destroyed at runtime
//! are picked up without rewiring.

mod poller;
mod wiring;

pub use poller::{queue_records_event, start_queue_pollers, POLL_WAIT};
pub use wiring::{
    object_records_event, register_bucket_notifications, register_stream_subscribers,
    stream_records_event,
};

use std::sync::Arc;

use lws_core::Clock;

use crate::compute::ComputeEngine;
use crate::queue::QueueEngine;

/// Engine handles the dispatch paths route through.
pub struct Fabric<C: Clock> {
    pub queues: Arc<QueueEngine<C>>,
    pub compute: Arc<ComputeEngine>,
}

impl<C: Clock> Fabric<C> {
    pub fn new(queues: Arc<QueueEngine<C>>, compute: Arc<ComputeEngine>) -> Arc<Self> {
        Arc::new(Self { queues, compute })
    }
}
