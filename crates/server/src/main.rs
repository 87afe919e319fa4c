// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! lwsd: the Local Web Services emulator daemon.
//!
//! Usage: `lwsd [config-file]`. The configuration may be TOML or
//! JSON; with no file, every service starts empty on its default
//! port.

use std::process::ExitCode;
use std::sync::Arc;

use lws_config::EmulatorConfig;
use lws_server::{start, LoggingRunner};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let config = match load_config() {
        Ok(config) => config,
        Err(message) => {
            eprintln!("lwsd: {message}");
            return ExitCode::FAILURE;
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("lws={}", config.global.log_level)));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let emulator = match start(config, Arc::new(LoggingRunner)).await {
        Ok(emulator) => emulator,
        Err(err) => {
            tracing::error!(error = %err, "startup failed");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "signal handler failed");
    }
    emulator.shutdown().await;
    ExitCode::SUCCESS
}

fn load_config() -> Result<EmulatorConfig, String> {
    let path = match std::env::args().nth(1) {
        Some(path) => path,
        None => return Ok(EmulatorConfig::default()),
    };
    let raw = std::fs::read_to_string(&path)
        .map_err(|err| format!("cannot read {path}: {err}"))?;
    let parsed = if path.ends_with(".json") {
        lws_config::from_json(&raw)
    } else {
        lws_config::from_toml(&raw)
    };
    parsed.map_err(|err| format!("invalid configuration {path}: {err}"))
}
