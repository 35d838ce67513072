// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! libops-adapters: side-effect boundary of the pipeline
//!
//! Every external surface the pipeline touches lives behind a trait here:
//! the admin API, the messaging bus, the platform token endpoint, and the
//! host (users, packet filter, git/compose). Each trait has a production
//! implementation and a `Fake` behind the `test-support` feature.

pub mod admin;
pub mod host;
pub mod publish;
pub mod subprocess;
pub mod token;

pub use admin::{AdminAdapter, AdminError, HttpAdminAdapter};
pub use host::{
    ComposeDeployAdapter, DeployAdapter, FilterAdapter, HostError, HostUser, IptablesAdapter,
    SystemUsersAdapter, UsersAdapter,
};
pub use publish::{HttpPublishAdapter, PublishAdapter, PublishError};
pub use token::{MetadataTokenSource, StaticTokenSource, TokenError, TokenSource};

#[cfg(any(test, feature = "test-support"))]
pub use admin::FakeAdminAdapter;
#[cfg(any(test, feature = "test-support"))]
pub use host::{FakeDeployAdapter, FakeFilterAdapter, FakeUsersAdapter};
#[cfg(any(test, feature = "test-support"))]
pub use publish::FakePublishAdapter;
