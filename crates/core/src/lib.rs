// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! libops-core: Domain types for the libops reconciliation pipeline
//!
//! Everything the pipeline crates share: scope hierarchy, queued mutation
//! events, reconciliation request types, site descriptors and desired-state
//! snapshots, plus the clock and id abstractions.

pub mod macros;

pub mod clock;
pub mod event;
pub mod id;
pub mod request;
pub mod scope;
pub mod site;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use clock::{Clock, FakeClock, SystemClock};
pub use event::{EventRecord, EventStatus, EventType, NewEvent};
pub use id::{short, DispatcherId, IdGen, UuidIdGen};
pub use request::RequestType;
pub use scope::{Scope, ScopeIds};
pub use site::{
    DeploymentSpec, FirewallRule, Member, OrgDescriptor, ProjectDescriptor, Protocol, RuleAction,
    Secret, SiteDescriptor, SiteStatus, SshKey,
};
