// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Host user management for the ssh_keys reconciler.

use super::HostError;
use crate::subprocess::{run_checked, USER_COMMAND_TIMEOUT};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::info;

/// One account on the host, as the reconciler sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostUser {
    pub name: String,
    pub home: PathBuf,
}

/// Adapter for managing host user accounts
#[async_trait]
pub trait UsersAdapter: Clone + Send + Sync + 'static {
    /// All regular accounts on the host.
    async fn list_users(&self) -> Result<Vec<HostUser>, HostError>;

    /// Create a passwordless account with the given home, in `group`.
    /// Must be a no-op if the account already exists.
    async fn create_user(&self, name: &str, home: &Path, group: &str) -> Result<(), HostError>;

    /// Remove an account together with its home directory.
    async fn remove_user(&self, name: &str) -> Result<(), HostError>;

    /// Recursively chown a path to the given account.
    async fn chown(&self, path: &Path, owner: &str) -> Result<(), HostError>;
}

/// Production adapter driving useradd/userdel/chown and /etc/passwd.
#[derive(Clone)]
pub struct SystemUsersAdapter {
    passwd_path: PathBuf,
}

impl Default for SystemUsersAdapter {
    fn default() -> Self {
        Self { passwd_path: PathBuf::from("/etc/passwd") }
    }
}

impl SystemUsersAdapter {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UsersAdapter for SystemUsersAdapter {
    async fn list_users(&self) -> Result<Vec<HostUser>, HostError> {
        let passwd = tokio::fs::read_to_string(&self.passwd_path).await?;
        Ok(passwd
            .lines()
            .filter_map(|line| {
                let mut fields = line.split(':');
                let name = fields.next()?;
                let home = fields.nth(4)?; // skip passwd, uid, gid, gecos
                Some(HostUser { name: name.to_string(), home: PathBuf::from(home) })
            })
            .collect())
    }

    async fn create_user(&self, name: &str, home: &Path, group: &str) -> Result<(), HostError> {
        if self.list_users().await?.iter().any(|u| u.name == name) {
            return Ok(());
        }

        info!(user = name, home = %home.display(), "creating account");
        let mut cmd = Command::new("useradd");
        cmd.args(["--create-home", "--home-dir"])
            .arg(home)
            .args(["--groups", group, "--shell", "/bin/bash", name]);
        run_checked(cmd, USER_COMMAND_TIMEOUT, "useradd")
            .await
            .map_err(HostError::Command)?;
        Ok(())
    }

    async fn remove_user(&self, name: &str) -> Result<(), HostError> {
        info!(user = name, "removing account and home");
        let mut cmd = Command::new("userdel");
        cmd.args(["--remove", name]);
        run_checked(cmd, USER_COMMAND_TIMEOUT, "userdel")
            .await
            .map_err(HostError::Command)?;
        Ok(())
    }

    async fn chown(&self, path: &Path, owner: &str) -> Result<(), HostError> {
        let mut cmd = Command::new("chown");
        cmd.args(["-R", &format!("{owner}:{owner}")]).arg(path);
        run_checked(cmd, USER_COMMAND_TIMEOUT, "chown")
            .await
            .map_err(HostError::Command)?;
        Ok(())
    }
}

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeUsersAdapter;

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Default)]
    struct FakeUsersState {
        users: Vec<HostUser>,
        removed: Vec<String>,
        chowned: Vec<(PathBuf, String)>,
        fail_message: Option<String>,
    }

    /// In-memory account list; `create_user` materializes the home directory
    /// so file-writing reconcilers can run against a tempdir.
    #[derive(Clone, Default)]
    pub struct FakeUsersAdapter {
        inner: Arc<Mutex<FakeUsersState>>,
    }

    impl FakeUsersAdapter {
        pub fn new() -> Self {
            Self::default()
        }

        /// Pre-register an account without creating its home.
        pub fn seed_user(&self, name: &str, home: &Path) {
            self.inner
                .lock()
                .users
                .push(HostUser { name: name.to_string(), home: home.to_path_buf() });
        }

        /// Accounts removed so far, in order.
        pub fn removed(&self) -> Vec<String> {
            self.inner.lock().removed.clone()
        }

        /// Chown calls recorded so far.
        pub fn chowned(&self) -> Vec<(PathBuf, String)> {
            self.inner.lock().chowned.clone()
        }

        /// Make every call fail until cleared.
        pub fn fail_with(&self, message: impl Into<String>) {
            self.inner.lock().fail_message = Some(message.into());
        }

        fn check_failure(&self) -> Result<(), HostError> {
            match &self.inner.lock().fail_message {
                Some(message) => Err(HostError::Command(message.clone())),
                None => Ok(()),
            }
        }
    }

    #[async_trait]
    impl UsersAdapter for FakeUsersAdapter {
        async fn list_users(&self) -> Result<Vec<HostUser>, HostError> {
            self.check_failure()?;
            Ok(self.inner.lock().users.clone())
        }

        async fn create_user(&self, name: &str, home: &Path, _group: &str) -> Result<(), HostError> {
            self.check_failure()?;
            let mut state = self.inner.lock();
            if state.users.iter().any(|u| u.name == name) {
                return Ok(());
            }
            std::fs::create_dir_all(home)?;
            state.users.push(HostUser { name: name.to_string(), home: home.to_path_buf() });
            Ok(())
        }

        async fn remove_user(&self, name: &str) -> Result<(), HostError> {
            self.check_failure()?;
            let mut state = self.inner.lock();
            if let Some(pos) = state.users.iter().position(|u| u.name == name) {
                let user = state.users.remove(pos);
                if user.home.exists() {
                    std::fs::remove_dir_all(&user.home)?;
                }
            }
            state.removed.push(name.to_string());
            Ok(())
        }

        async fn chown(&self, path: &Path, owner: &str) -> Result<(), HostError> {
            self.check_failure()?;
            self.inner.lock().chowned.push((path.to_path_buf(), owner.to_string()));
            Ok(())
        }
    }
}

#[cfg(test)]
#[path = "users_tests.rs"]
mod tests;
