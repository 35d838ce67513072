// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test fixtures for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::event::{EventRecord, EventStatus, EventType, NewEvent};
use crate::scope::ScopeIds;
use crate::site::{
    DeploymentSpec, FirewallRule, Member, Protocol, RuleAction, Secret, SiteDescriptor,
    SiteStatus, SshKey,
};
use uuid::Uuid;

/// A pending queue row with fixed timestamps and an empty payload.
pub fn event_record(id: u64, event_type: &str) -> EventRecord {
    EventRecord {
        id,
        event_id: Uuid::new_v4(),
        event_type: EventType::from(event_type),
        source: "io.libops.api".to_string(),
        subject: format!("subject-{id}"),
        scope: ScopeIds::site(1, 1, 1),
        data: Vec::new(),
        content_type: "application/json".to_string(),
        status: EventStatus::Pending,
        retry_count: 0,
        last_error: None,
        created_at_ms: 1_000_000,
        claimed_at_ms: None,
        sent_at_ms: None,
        last_retry_at_ms: None,
        processing_by: None,
    }
}

/// A [`NewEvent`] ready to enqueue, with the given type and scope chain.
pub fn new_event(event_type: &str, scope: ScopeIds) -> NewEvent {
    NewEvent {
        event_id: Uuid::new_v4(),
        event_type: EventType::from(event_type),
        source: "io.libops.api".to_string(),
        subject: "subject".to_string(),
        scope,
        data: b"{}".to_vec(),
        content_type: "application/json".to_string(),
    }
}

pub fn site_descriptor(id: i64, project_id: i64) -> SiteDescriptor {
    SiteDescriptor {
        id,
        public_id: Uuid::new_v4(),
        project_id,
        external_address: Some(format!("203.0.113.{}", id % 250)),
        status: SiteStatus::Active,
    }
}

pub fn member(public_id: Uuid, keys: &[(&str, &str)]) -> Member {
    Member {
        public_id,
        display_name: "Test Member".to_string(),
        email: "member@example.com".to_string(),
        ssh_keys: keys
            .iter()
            .map(|(public_key, fingerprint)| SshKey {
                public_key: public_key.to_string(),
                fingerprint: fingerprint.to_string(),
            })
            .collect(),
    }
}

pub fn secret(id: i64, key: &str, value: &str) -> Secret {
    Secret { id, key: key.to_string(), value: value.to_string() }
}

pub fn firewall_rule(id: i64, port: u16, action: RuleAction) -> FirewallRule {
    FirewallRule {
        id,
        protocol: Protocol::Tcp,
        port,
        source_cidr: "0.0.0.0/0".to_string(),
        action,
    }
}

pub fn deployment_spec(path: &str) -> DeploymentSpec {
    DeploymentSpec {
        deployment_id: "dep-test".to_string(),
        repo: "https://git.example/acme/app.git".to_string(),
        git_ref: "main".to_string(),
        token: "shhh".to_string(),
        path: path.to_string(),
        compose_file: "docker-compose.yml".to_string(),
        env: indexmap::IndexMap::new(),
        commit_sha: None,
    }
}
