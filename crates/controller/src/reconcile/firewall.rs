// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Firewall reconciliation: rebuild the managed chain.
//!
//! The chain is flushed and repopulated in rule-list order on every pass;
//! no diffing, no deduplication. The single INPUT jump into the chain is
//! check-then-insert so repeated passes never stack jumps.

use super::ReconcileError;
use libops_adapters::FilterAdapter;
use libops_core::FirewallRule;

/// Rebuild the chain from the desired rule list.
pub(crate) async fn apply<F: FilterAdapter>(
    filter: &F,
    chain: &str,
    rules: &[FirewallRule],
) -> Result<(), ReconcileError> {
    filter.ensure_chain(chain).await?;
    filter.flush_chain(chain).await?;
    for rule in rules {
        filter.append_rule(chain, rule).await?;
    }
    filter.ensure_input_jump(chain).await?;
    Ok(())
}

#[cfg(test)]
#[path = "firewall_tests.rs"]
mod tests;
