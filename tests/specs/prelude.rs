// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared rig for the end-to-end scenarios.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use lws_config::{FunctionSpec, QueueSpec};
use lws_core::FakeClock;
use lws_engine::queue::QueueEngine;
use lws_engine::topic::TopicEngine;
use lws_engine::{ComputeEngine, Fabric, RecordingRunner};

pub use lws_core::AttrValue;
pub use lws_core::Item;

/// Queue + compute + topic engines over a controllable clock.
pub struct Rig {
    pub clock: FakeClock,
    pub queues: Arc<QueueEngine<FakeClock>>,
    pub compute: Arc<ComputeEngine>,
    pub fabric: Arc<Fabric<FakeClock>>,
    pub topics: TopicEngine<FakeClock>,
    pub runner: Arc<RecordingRunner>,
}

pub fn rig(queues: &[QueueSpec], functions: &[&str]) -> Rig {
    let clock = FakeClock::new();
    let queue_engine = Arc::new(QueueEngine::from_config(queues, clock.clone()));
    let runner = RecordingRunner::new();
    let compute = Arc::new(ComputeEngine::new(
        functions.iter().map(|name| function(name)).collect(),
        runner.clone(),
    ));
    let fabric = Fabric::new(queue_engine.clone(), compute.clone());
    let topics = TopicEngine::new(clock.clone(), fabric.clone());
    Rig { clock, queues: queue_engine, compute, fabric, topics, runner }
}

pub fn queue_spec(name: &str) -> QueueSpec {
    QueueSpec {
        name: name.to_string(),
        visibility_timeout_secs: 30,
        fifo: name.ends_with(".fifo"),
        content_based_dedup: false,
        redrive: None,
        tags: HashMap::new(),
    }
}

pub fn function(name: &str) -> FunctionSpec {
    FunctionSpec {
        name: name.to_string(),
        runtime: "nodejs20.x".to_string(),
        handler: "index.handler".to_string(),
        timeout_secs: 30,
        memory_mb: 128,
        env: HashMap::new(),
    }
}

pub fn item(pairs: &[(&str, AttrValue)]) -> Item {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

/// Yield until spawned dispatch tasks have run.
pub async fn settle() {
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
}

pub const NO_WAIT: Duration = Duration::ZERO;
