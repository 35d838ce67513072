// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Debounce groups: collapse, scope upgrade, emission timing.
//!
//! Claimed events fold into an in-memory map keyed by effective scope.
//! Events on the same ancestor line merge; when a broader event arrives
//! in-window, the group's key is promoted to the ancestor and any narrower
//! groups on that line are absorbed. A group emits once its debounce window
//! (measured from the earliest claim in the group) has elapsed.

use crate::config::Tuning;
use libops_core::{EventRecord, RequestType, Scope, ScopeIds};
use std::collections::BTreeSet;
use uuid::Uuid;

/// One pending reconciliation bucket.
#[derive(Debug, Clone)]
pub struct Group {
    /// Effective scope after upgrades.
    pub scope: Scope,
    pub scope_id: i64,
    /// Merged ancestor chain of everything folded in.
    pub chain: ScopeIds,
    /// Queue row ids, fold order.
    pub rows: Vec<u64>,
    /// Global event ids, fold order.
    pub event_ids: Vec<Uuid>,
    /// Categories seen across folded events.
    pub categories: BTreeSet<RequestType>,
    /// Claim timestamp of the earliest event; anchors the debounce window.
    pub first_claimed_at_ms: u64,
}

impl Group {
    fn from_record(record: &EventRecord, scope: Scope, scope_id: i64) -> Self {
        let mut categories = BTreeSet::new();
        categories.insert(record.event_type.category());
        Self {
            scope,
            scope_id,
            chain: record.scope,
            rows: vec![record.id],
            event_ids: vec![record.event_id],
            categories,
            first_claimed_at_ms: record.claimed_at_ms.unwrap_or(record.created_at_ms),
        }
    }

    fn absorb_record(&mut self, record: &EventRecord) {
        self.chain = self.chain.merge(&record.scope);
        self.rows.push(record.id);
        self.event_ids.push(record.event_id);
        self.categories.insert(record.event_type.category());
        let claimed = record.claimed_at_ms.unwrap_or(record.created_at_ms);
        self.first_claimed_at_ms = self.first_claimed_at_ms.min(claimed);
    }

    fn absorb_group(&mut self, other: Group) {
        self.chain = self.chain.merge(&other.chain);
        self.rows.extend(other.rows);
        self.event_ids.extend(other.event_ids);
        self.categories.extend(other.categories);
        self.first_claimed_at_ms = self.first_claimed_at_ms.min(other.first_claimed_at_ms);
    }

    /// Broadest scope this group shares with an event chain, if any.
    fn overlap(&self, other: &ScopeIds) -> Option<(Scope, i64)> {
        let other_scope = other.innermost()?;
        let broadest = self.scope.max(other_scope);
        let mine = self.chain.id_of(broadest)?;
        let theirs = other.id_of(broadest)?;
        (mine == theirs).then_some((broadest, mine))
    }

    fn contains_row(&self, id: u64) -> bool {
        self.rows.contains(&id)
    }

    fn due_at_ms(&self, tuning: &Tuning) -> u64 {
        self.first_claimed_at_ms + tuning.debounce_window_ms(self.scope)
    }
}

/// All groups a dispatcher currently holds, across poll cycles.
#[derive(Debug, Default)]
pub struct GroupMap {
    groups: Vec<Group>,
}

impl GroupMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Fold one claimed event into the map.
    ///
    /// Rows already held (re-listed by `get_claimed` on a later poll) are
    /// ignored. Events without scope ids cannot be routed and are skipped;
    /// the caller dead-letters them.
    pub fn fold(&mut self, record: &EventRecord) -> bool {
        if self.groups.iter().any(|g| g.contains_row(record.id)) {
            return true;
        }
        let Some((event_scope, event_scope_id)) = record.scope.key() else {
            return false;
        };

        // Indices of existing groups sharing an ancestor line with this
        // event, together with the broadest shared scope.
        let overlapping: Vec<(usize, (Scope, i64))> = self
            .groups
            .iter()
            .enumerate()
            .filter_map(|(i, g)| g.overlap(&record.scope).map(|o| (i, o)))
            .collect();

        if overlapping.is_empty() {
            self.groups.push(Group::from_record(record, event_scope, event_scope_id));
            return true;
        }

        // The surviving group lives at the broadest scope involved.
        let (&(first_idx, (mut scope, mut scope_id)), rest) =
            match overlapping.split_first() {
                Some(split) => split,
                None => return true, // unreachable: overlapping is non-empty
            };
        for &(_, (s, id)) in rest {
            if s > scope {
                scope = s;
                scope_id = id;
            }
        }

        // Absorb every overlapping group into the first, then re-key it.
        let mut merged = self.groups[first_idx].clone();
        for &(idx, _) in overlapping.iter().skip(1).rev() {
            let absorbed = self.groups.remove(idx);
            merged.absorb_group(absorbed);
        }
        merged.absorb_record(record);
        merged.scope = scope;
        merged.scope_id = scope_id;
        self.groups[first_idx] = merged;
        true
    }

    /// Remove and return every group whose debounce window has elapsed.
    pub fn take_due(&mut self, now_ms: u64, tuning: &Tuning) -> Vec<Group> {
        let mut due = Vec::new();
        let mut i = 0;
        while i < self.groups.len() {
            if self.groups[i].due_at_ms(tuning) <= now_ms {
                due.push(self.groups.remove(i));
            } else {
                i += 1;
            }
        }
        due
    }

    /// Drop held rows whose claims were released back to the queue; their
    /// in-memory copies must not linger (they re-fold on re-claim).
    pub fn forget_rows(&mut self, rows: &[u64]) {
        for group in &mut self.groups {
            // rows and event_ids are parallel vectors; drop pairs together.
            let mut i = 0;
            while i < group.rows.len() {
                if rows.contains(&group.rows[i]) {
                    group.rows.remove(i);
                    group.event_ids.remove(i);
                } else {
                    i += 1;
                }
            }
        }
        self.groups.retain(|g| !g.rows.is_empty());
    }
}

#[cfg(test)]
#[path = "group_tests.rs"]
mod tests;
