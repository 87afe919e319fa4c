// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! lws-server: the HTTP face of the emulator.
//!
//! One axum router per enabled service, each speaking that service's
//! wire dialect, each wrapped in the shared middleware chain
//! (logging → mocking → identity auth → chaos → handler). The
//! supervisor owns startup order, cross-engine wiring, and shutdown.

pub mod adapters;
pub mod control;
pub mod middleware;
pub mod runner;
pub mod state;
pub mod supervisor;

#[cfg(test)]
pub(crate) mod test_support;

pub use runner::LoggingRunner;
pub use state::{Engines, ServerState};
pub use supervisor::{start, RunningEmulator};

/// Management path prefix that bypasses mock, auth, and chaos.
pub const MANAGEMENT_PREFIX: &str = "/_lws/";
