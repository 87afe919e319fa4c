// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! lws-core: shared foundation for the Local Web Services emulator.
//!
//! Holds the pieces every other crate leans on: the [`Clock`]
//! abstraction for testable time, the [`EngineError`] taxonomy that
//! service engines return and adapters translate, the typed
//! [`AttrValue`] attribute model used by tables and message
//! attributes, id generation, and ARN construction for the fixed
//! local account.

pub mod arn;
pub mod clock;
pub mod error;
pub mod id;
pub mod value;

pub use clock::{iso8601_ms, iso8601_secs, Clock, FakeClock, SystemClock};
pub use error::{CancellationReason, EngineError};
pub use id::{IdGen, SeqIdGen, UuidIdGen};
pub use value::{AttrValue, Item, MessageAttr};
