// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ID generation abstractions.
//!
//! Message ids, receipt handles, event ids, and execution names are
//! all opaque strings on the wire; [`UuidIdGen`] produces them in
//! production and [`SeqIdGen`] makes them deterministic in tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Generates opaque identifier strings.
pub trait IdGen: Send + Sync + 'static {
    fn next(&self) -> String;
}

/// Random v4 UUID generator used in production.
#[derive(Clone, Default)]
pub struct UuidIdGen;

impl IdGen for UuidIdGen {
    fn next(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Deterministic sequential generator for tests (`msg-1`, `msg-2`, …).
#[derive(Clone)]
pub struct SeqIdGen {
    prefix: &'static str,
    counter: Arc<AtomicU64>,
}

impl SeqIdGen {
    pub fn new(prefix: &'static str) -> Self {
        Self { prefix, counter: Arc::new(AtomicU64::new(0)) }
    }
}

impl IdGen for SeqIdGen {
    fn next(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{}-{}", self.prefix, n)
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
