// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle supervisor.
//!
//! Builds every engine, wires the dispatch fabric, starts background
//! loops (stream flush, schedulers, pollers), and binds one listener
//! per enabled service. Shutdown cancels a shared token that every
//! loop observes at its next suspension point.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use lws_config::EmulatorConfig;
use lws_core::{EngineError, SystemClock};
use lws_engine::bus::BusEngine;
use lws_engine::fabric::{
    register_bucket_notifications, register_stream_subscribers, start_queue_pollers,
};
use lws_engine::identity::IdentityEngine;
use lws_engine::object::ObjectStoreEngine;
use lws_engine::params::ParameterStoreEngine;
use lws_engine::queue::QueueEngine;
use lws_engine::secrets::SecretStoreEngine;
use lws_engine::sfn::{ExecOptions, StateMachineEngine};
use lws_engine::table::{StreamDispatcher, TableEngine};
use lws_engine::topic::TopicEngine;
use lws_engine::{ComputeEngine, ComputeRunner, Fabric};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::adapters;
use crate::control;
use crate::middleware;
use crate::state::{Engines, ServerState};

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("engine setup failed: {0}")]
    Engine(#[from] EngineError),
    #[error("failed to bind {service} on port {port}: {source}")]
    Bind { service: &'static str, port: u16, source: std::io::Error },
}

/// A started emulator: engine handles, bound addresses, and the
/// shutdown token.
pub struct RunningEmulator {
    pub state: ServerState,
    pub addrs: HashMap<&'static str, SocketAddr>,
    cancel: CancellationToken,
    tasks: Vec<tokio::task::JoinHandle<()>>,
}

impl RunningEmulator {
    /// Signal every loop and listener, then wait for them to finish.
    pub async fn shutdown(self) {
        info!("shutting down");
        self.state.engines.stream.shutdown();
        self.cancel.cancel();
        for task in self.tasks {
            let _ = task.await;
        }
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

/// Build every engine from the configuration, leaves first: queues and
/// compute, then the fabric, then everything that dispatches through
/// it.
pub fn build_engines(
    config: &EmulatorConfig,
    runner: Arc<dyn ComputeRunner>,
) -> Result<Engines, SupervisorError> {
    let clock = SystemClock;
    let queues = Arc::new(QueueEngine::from_config(&config.queues, clock.clone()));
    let compute = Arc::new(ComputeEngine::new(config.functions.clone(), runner));
    let fabric = Fabric::new(queues.clone(), compute.clone());

    let stream = StreamDispatcher::with_defaults();
    let tables = Arc::new(TableEngine::from_config(&config.tables, clock.clone(), stream.clone()));
    let objects = Arc::new(ObjectStoreEngine::from_config(&config.buckets, clock.clone()));
    let topics =
        Arc::new(TopicEngine::from_config(&config.topics, clock.clone(), fabric.clone())?);
    let bus = Arc::new(BusEngine::from_config(&config.buses, clock.clone(), fabric.clone())?);
    let sfn = Arc::new(StateMachineEngine::from_config(
        &config.state_machines,
        clock.clone(),
        compute.clone(),
        ExecOptions::default(),
    )?);
    let params = Arc::new(ParameterStoreEngine::from_config(&config.parameters, clock.clone()));
    let secrets = Arc::new(SecretStoreEngine::from_config(&config.secrets, clock.clone()));
    let identity = Arc::new(IdentityEngine::from_config(&config.identity, clock));

    Ok(Engines {
        queues,
        compute,
        fabric,
        stream,
        tables,
        objects,
        topics,
        bus,
        sfn,
        params,
        secrets,
        identity,
    })
}

/// Start the emulator: engines, fabric wiring, background loops, and
/// one HTTP listener per enabled service.
pub async fn start(
    config: EmulatorConfig,
    runner: Arc<dyn ComputeRunner>,
) -> Result<RunningEmulator, SupervisorError> {
    let engines = Arc::new(build_engines(&config, runner)?);
    let config = Arc::new(config);
    let state = ServerState::new(engines.clone(), config.clone());
    let cancel = CancellationToken::new();
    let mut tasks = Vec::new();

    // Fabric wiring before any traffic: stream subscribers and bucket
    // notifications resolve their targets by name at dispatch time,
    // but registration itself happens once, here.
    register_stream_subscribers(
        &engines.tables,
        engines.compute.clone(),
        &config.event_source_mappings,
    );
    register_bucket_notifications(&engines.objects, engines.compute.clone(), &config.buckets);

    tasks.push(engines.stream.clone().start());
    tasks.extend(engines.bus.clone().start_scheduler(cancel.clone()));
    tasks.extend(start_queue_pollers(
        &engines.fabric,
        &config.event_source_mappings,
        cancel.clone(),
    ));

    let mut addrs = HashMap::new();
    for &service in lws_config::SERVICES {
        let settings = config.service(service);
        if !settings.enabled {
            continue;
        }
        let router = service_router(service, &state);
        let listener = TcpListener::bind(("127.0.0.1", settings.port)).await.map_err(
            |source| SupervisorError::Bind { service, port: settings.port, source },
        )?;
        let addr = listener.local_addr().map_err(|source| SupervisorError::Bind {
            service,
            port: settings.port,
            source,
        })?;
        addrs.insert(service, addr);
        info!(service, %addr, "listening");

        let cancel = cancel.clone();
        tasks.push(tokio::spawn(async move {
            let serve = axum::serve(listener, router)
                .with_graceful_shutdown(async move { cancel.cancelled().await });
            if let Err(err) = serve.await {
                tracing::error!(service, error = %err, "listener failed");
            }
        }));
    }

    info!(services = addrs.len(), "emulator ready");
    Ok(RunningEmulator { state, addrs, cancel, tasks })
}

/// The full router for one service: adapter + control plane, wrapped
/// in the middleware chain.
pub fn service_router(service: &'static str, state: &ServerState) -> axum::Router {
    let state = state.for_service(service);
    let adapter = match service {
        "sqs" => adapters::queue::router(state.clone()),
        "sns" => adapters::topic::router(state.clone()),
        "dynamodb" => adapters::table::router(state.clone()),
        "s3" => adapters::object::router(state.clone()),
        "events" => adapters::bus::router(state.clone()),
        "stepfunctions" => adapters::sfn::router(state.clone()),
        "cognito-idp" => adapters::identity::router(state.clone()),
        "ssm" => adapters::params::router(state.clone()),
        "secretsmanager" => adapters::secrets::router(state.clone()),
        "sts" => adapters::sts::router(state.clone()),
        _ => axum::Router::new(),
    };
    let router = adapter.merge(control::router(state.clone()));
    middleware::apply(router, state)
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
