// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request-type classification for collapsed groups.
//!
//! Each event already knows its category ([`EventType::category`]); a group
//! mixing categories emits one request per category, except that `full`
//! subsumes everything.
//!
//! [`EventType::category`]: libops_core::EventType::category

use libops_core::RequestType;
use std::collections::BTreeSet;

/// The outbound request types for a group's category set.
///
/// Total: an empty set (impossible in practice, every event classifies)
/// falls back to `full`, which covers any surface.
pub fn request_types(categories: &BTreeSet<RequestType>) -> Vec<RequestType> {
    if categories.is_empty() || categories.contains(&RequestType::Full) {
        return vec![RequestType::Full];
    }
    categories.iter().copied().collect()
}

#[cfg(test)]
#[path = "classify_tests.rs"]
mod tests;
