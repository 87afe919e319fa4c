// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared server state: engine handles plus the middleware stores.

use std::sync::Arc;

use lws_config::EmulatorConfig;
use lws_core::SystemClock;
use lws_engine::bus::BusEngine;
use lws_engine::identity::IdentityEngine;
use lws_engine::object::ObjectStoreEngine;
use lws_engine::params::ParameterStoreEngine;
use lws_engine::queue::QueueEngine;
use lws_engine::secrets::SecretStoreEngine;
use lws_engine::sfn::StateMachineEngine;
use lws_engine::table::{StreamDispatcher, TableEngine};
use lws_engine::topic::TopicEngine;
use lws_engine::{ComputeEngine, Fabric};

use crate::middleware::chaos::ChaosStore;
use crate::middleware::logging::LogHub;
use crate::middleware::mock::MockStore;

/// Every engine the server fronts, wired over the system clock.
pub struct Engines {
    pub queues: Arc<QueueEngine<SystemClock>>,
    pub compute: Arc<ComputeEngine>,
    pub fabric: Arc<Fabric<SystemClock>>,
    pub stream: Arc<StreamDispatcher>,
    pub tables: Arc<TableEngine<SystemClock>>,
    pub objects: Arc<ObjectStoreEngine<SystemClock>>,
    pub topics: Arc<TopicEngine<SystemClock>>,
    pub bus: Arc<BusEngine<SystemClock>>,
    pub sfn: Arc<StateMachineEngine<SystemClock>>,
    pub params: Arc<ParameterStoreEngine<SystemClock>>,
    pub secrets: Arc<SecretStoreEngine<SystemClock>>,
    pub identity: Arc<IdentityEngine<SystemClock>>,
}

/// Handle shared by every adapter and middleware layer.
#[derive(Clone)]
pub struct ServerState {
    pub engines: Arc<Engines>,
    pub config: Arc<EmulatorConfig>,
    pub log_hub: Arc<LogHub>,
    pub mocks: Arc<MockStore>,
    pub chaos: Arc<ChaosStore>,
    /// The service a particular router serves; set per router.
    pub service: &'static str,
}

impl ServerState {
    pub fn new(engines: Arc<Engines>, config: Arc<EmulatorConfig>) -> Self {
        Self {
            engines,
            config,
            log_hub: Arc::new(LogHub::new()),
            mocks: Arc::new(MockStore::default()),
            chaos: Arc::new(ChaosStore::default()),
            service: "",
        }
    }

    pub fn for_service(&self, service: &'static str) -> Self {
        let mut state = self.clone();
        state.service = service;
        state
    }
}
