// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! libops-dispatcher: event ingestion and reconciliation dispatch
//!
//! Two halves share one durable queue:
//! - the [`Emitter`] accepts event descriptors from the RPC layer, resolves
//!   the full scope chain and enqueues one event per mutation;
//! - the [`Dispatcher`] polls the queue, debounces and collapses events by
//!   scope, upgrades overlapping scopes, classifies request types, and
//!   publishes one reconciliation request per (scope, type) bucket.

pub mod config;
pub mod emitter;
pub mod ingest;
pub mod router;

pub use config::{Config, Tuning};
pub use emitter::{Emitter, EmitError, EventDescriptor, ScopeRef};
pub use router::{DispatchError, Dispatcher, TickStats};
