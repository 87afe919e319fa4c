// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The per-request middleware chain.
//!
//! Order on the wire: request logging → operation mocking → identity
//! auth → chaos injection → handler. Management paths skip everything
//! but logging.

pub mod auth;
pub mod chaos;
pub mod extract;
pub mod logging;
pub mod mock;

#[cfg(test)]
#[path = "chaos_tests.rs"]
mod chaos_tests;
#[cfg(test)]
#[path = "extract_tests.rs"]
mod extract_tests;

use axum::middleware::from_fn_with_state;
use axum::Router;

use crate::state::ServerState;

/// Wrap a service router in the standard chain. Layers added last run
/// first, so logging is added last to sit outermost.
pub fn apply(router: Router, state: ServerState) -> Router {
    router
        .layer(from_fn_with_state(state.clone(), chaos::layer))
        .layer(from_fn_with_state(state.clone(), auth::layer))
        .layer(from_fn_with_state(state.clone(), mock::layer))
        .layer(from_fn_with_state(state, logging::layer))
}

/// True for paths under the management prefix.
pub fn is_management(path: &str) -> bool {
    path.starts_with(crate::MANAGEMENT_PREFIX)
}
