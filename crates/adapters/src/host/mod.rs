// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Host adapters: users, packet filter, git/compose.
//!
//! Everything a sub-reconciler does to the VM goes through these traits so
//! the apply logic can be exercised against fakes. Production
//! implementations shell out to the usual host tooling.

mod deploy;
mod filter;
mod users;

pub use deploy::{ComposeDeployAdapter, DeployAdapter};
pub use filter::{FilterAdapter, IptablesAdapter};
pub use users::{HostUser, SystemUsersAdapter, UsersAdapter};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use deploy::FakeDeployAdapter;
#[cfg(any(test, feature = "test-support"))]
pub use filter::FakeFilterAdapter;
#[cfg(any(test, feature = "test-support"))]
pub use users::FakeUsersAdapter;

use thiserror::Error;

/// Errors from host operations
#[derive(Debug, Error)]
pub enum HostError {
    #[error("{0}")]
    Command(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
