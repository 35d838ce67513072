// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Packet filter management for the firewall reconciler.

use super::HostError;
use crate::subprocess::{run_checked, run_with_timeout, FILTER_COMMAND_TIMEOUT};
use async_trait::async_trait;
use libops_core::{FirewallRule, Protocol};
use tokio::process::Command;

/// Adapter for the host packet filter
#[async_trait]
pub trait FilterAdapter: Clone + Send + Sync + 'static {
    /// Create the chain if it does not exist yet.
    async fn ensure_chain(&self, chain: &str) -> Result<(), HostError>;

    /// Remove every rule from the chain.
    async fn flush_chain(&self, chain: &str) -> Result<(), HostError>;

    /// Append one rule at the end of the chain.
    async fn append_rule(&self, chain: &str, rule: &FirewallRule) -> Result<(), HostError>;

    /// Ensure exactly one jump from INPUT into the chain (check-then-insert).
    async fn ensure_input_jump(&self, chain: &str) -> Result<(), HostError>;
}

/// Production adapter driving iptables.
#[derive(Clone, Default)]
pub struct IptablesAdapter;

impl IptablesAdapter {
    pub fn new() -> Self {
        Self
    }

    fn command(args: &[&str]) -> Command {
        let mut cmd = Command::new("iptables");
        cmd.args(args);
        cmd
    }
}

#[async_trait]
impl FilterAdapter for IptablesAdapter {
    async fn ensure_chain(&self, chain: &str) -> Result<(), HostError> {
        // -L exits 0 when the chain exists; -N creates it otherwise.
        let probe =
            run_with_timeout(Self::command(&["-n", "-L", chain]), FILTER_COMMAND_TIMEOUT, "iptables -L")
                .await
                .map_err(HostError::Command)?;
        if probe.status.success() {
            return Ok(());
        }
        run_checked(Self::command(&["-N", chain]), FILTER_COMMAND_TIMEOUT, "iptables -N")
            .await
            .map_err(HostError::Command)?;
        Ok(())
    }

    async fn flush_chain(&self, chain: &str) -> Result<(), HostError> {
        run_checked(Self::command(&["-F", chain]), FILTER_COMMAND_TIMEOUT, "iptables -F")
            .await
            .map_err(HostError::Command)?;
        Ok(())
    }

    async fn append_rule(&self, chain: &str, rule: &FirewallRule) -> Result<(), HostError> {
        let protocol = rule.protocol.to_string();
        let port = rule.port.to_string();
        let mut args = vec!["-A", chain, "-p", protocol.as_str()];
        // icmp has no port match.
        if rule.protocol != Protocol::Icmp {
            args.extend(["--dport", port.as_str()]);
        }
        args.extend(["-s", rule.source_cidr.as_str(), "-j", rule.action.target()]);
        run_checked(Self::command(&args), FILTER_COMMAND_TIMEOUT, "iptables -A")
            .await
            .map_err(HostError::Command)?;
        Ok(())
    }

    async fn ensure_input_jump(&self, chain: &str) -> Result<(), HostError> {
        let probe = run_with_timeout(
            Self::command(&["-C", "INPUT", "-j", chain]),
            FILTER_COMMAND_TIMEOUT,
            "iptables -C",
        )
        .await
        .map_err(HostError::Command)?;
        if probe.status.success() {
            return Ok(());
        }
        run_checked(
            Self::command(&["-I", "INPUT", "-j", chain]),
            FILTER_COMMAND_TIMEOUT,
            "iptables -I",
        )
        .await
        .map_err(HostError::Command)?;
        Ok(())
    }
}

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeFilterAdapter;

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::Arc;

    #[derive(Default)]
    struct FakeFilterState {
        chains: HashMap<String, Vec<String>>,
        input_jumps: Vec<String>,
        fail_message: Option<String>,
    }

    /// Materializes chains in memory so tests can assert the final ruleset.
    #[derive(Clone, Default)]
    pub struct FakeFilterAdapter {
        inner: Arc<Mutex<FakeFilterState>>,
    }

    impl FakeFilterAdapter {
        pub fn new() -> Self {
            Self::default()
        }

        /// Rendered rules of a chain, in order.
        pub fn chain(&self, chain: &str) -> Option<Vec<String>> {
            self.inner.lock().chains.get(chain).cloned()
        }

        /// Jumps from INPUT, in insertion order.
        pub fn input_jumps(&self) -> Vec<String> {
            self.inner.lock().input_jumps.clone()
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
    impl FilterAdapter for FakeFilterAdapter {
        async fn ensure_chain(&self, chain: &str) -> Result<(), HostError> {
            self.check_failure()?;
            self.inner.lock().chains.entry(chain.to_string()).or_default();
            Ok(())
        }

        async fn flush_chain(&self, chain: &str) -> Result<(), HostError> {
            self.check_failure()?;
            if let Some(rules) = self.inner.lock().chains.get_mut(chain) {
                rules.clear();
            }
            Ok(())
        }

        async fn append_rule(&self, chain: &str, rule: &FirewallRule) -> Result<(), HostError> {
            self.check_failure()?;
            let rendered = format!(
                "-p {} --dport {} -s {} -j {}",
                rule.protocol, rule.port, rule.source_cidr, rule.action.target()
            );
            self.inner
                .lock()
                .chains
                .entry(chain.to_string())
                .or_default()
                .push(rendered);
            Ok(())
        }

        async fn ensure_input_jump(&self, chain: &str) -> Result<(), HostError> {
            self.check_failure()?;
            let mut state = self.inner.lock();
            if !state.input_jumps.iter().any(|c| c == chain) {
                state.input_jumps.push(chain.to_string());
            }
            Ok(())
        }
    }
}

#[cfg(test)]
#[path = "filter_tests.rs"]
mod tests;
