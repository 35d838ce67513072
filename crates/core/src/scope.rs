// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scope hierarchy: Organization ⊃ Project ⊃ Site
//!
//! Every mutation event targets exactly one scope (its innermost non-null
//! id). The dispatcher promotes overlapping scopes to their broadest common
//! ancestor before publishing, so `Scope` ordering matters: `Site <
//! Project < Organization`.

use serde::{Deserialize, Serialize};

/// One level of the resource hierarchy.
///
/// Ordering follows breadth: an `Organization` event covers every site under
/// every project of the org, a `Project` event covers the project's sites,
/// and a `Site` event covers exactly one site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Site,
    Project,
    Organization,
}

crate::simple_display! {
    Scope {
        Site => "site",
        Project => "project",
        Organization => "organization",
    }
}

impl Scope {
    /// Parse the scope token used in event type names.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "site" => Some(Scope::Site),
            "project" => Some(Scope::Project),
            "organization" => Some(Scope::Organization),
            _ => None,
        }
    }
}

/// Internal ids of the scope chain an event belongs to.
///
/// At most the innermost id is the event's scope; ancestors are back-filled
/// by the emitter so the dispatcher can detect overlap without extra lookups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeIds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_id: Option<i64>,
}

impl ScopeIds {
    pub fn organization(organization_id: i64) -> Self {
        Self { organization_id: Some(organization_id), ..Default::default() }
    }

    pub fn project(organization_id: i64, project_id: i64) -> Self {
        Self {
            organization_id: Some(organization_id),
            project_id: Some(project_id),
            site_id: None,
        }
    }

    pub fn site(organization_id: i64, project_id: i64, site_id: i64) -> Self {
        Self {
            organization_id: Some(organization_id),
            project_id: Some(project_id),
            site_id: Some(site_id),
        }
    }

    /// The event scope: innermost non-null id.
    pub fn innermost(&self) -> Option<Scope> {
        if self.site_id.is_some() {
            Some(Scope::Site)
        } else if self.project_id.is_some() {
            Some(Scope::Project)
        } else if self.organization_id.is_some() {
            Some(Scope::Organization)
        } else {
            None
        }
    }

    /// Id at the given level of the chain, if known.
    pub fn id_of(&self, scope: Scope) -> Option<i64> {
        match scope {
            Scope::Site => self.site_id,
            Scope::Project => self.project_id,
            Scope::Organization => self.organization_id,
        }
    }

    /// Innermost `(scope, id)` pair, the grouping key before any upgrade.
    pub fn key(&self) -> Option<(Scope, i64)> {
        let scope = self.innermost()?;
        Some((scope, self.id_of(scope)?))
    }

    /// Broadest scope shared by two chains, if they lie on one ancestor line.
    ///
    /// A site event and a project event overlap when the site belongs to that
    /// project; the result is the broader scope (here `Project`). Disjoint
    /// chains return `None`.
    pub fn overlap(&self, other: &ScopeIds) -> Option<(Scope, i64)> {
        let broadest = self.innermost()?.max(other.innermost()?);
        let mine = self.id_of(broadest)?;
        let theirs = other.id_of(broadest)?;
        (mine == theirs).then_some((broadest, mine))
    }

    /// Union of two chains on the same ancestor line.
    ///
    /// Narrower ids that disagree are dropped (the broader reconciliation
    /// covers every descendant anyway).
    pub fn merge(&self, other: &ScopeIds) -> ScopeIds {
        ScopeIds {
            organization_id: keep_if_agreed(self.organization_id, other.organization_id),
            project_id: keep_if_agreed(self.project_id, other.project_id),
            site_id: keep_if_agreed(self.site_id, other.site_id),
        }
    }
}

fn keep_if_agreed(a: Option<i64>, b: Option<i64>) -> Option<i64> {
    match (a, b) {
        (Some(x), Some(y)) if x == y => Some(x),
        (Some(x), None) => Some(x),
        (None, Some(y)) => Some(y),
        _ => None,
    }
}

#[cfg(test)]
#[path = "scope_tests.rs"]
mod tests;
