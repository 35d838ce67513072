//! Classification specs
//!
//! Request type is a total function of the event types in a group, with
//! `full` subsuming everything else.

use crate::prelude::*;
use libops_core::ScopeIds;

async fn classify_one(event_type: &str, scope: ScopeIds) -> RequestType {
    let mut h = PipelineHarness::new();
    h.enqueue(event_type, scope);
    h.settle(7_000, 1_000).await;

    let published = h.publisher.published();
    assert_eq!(published.len(), 1);
    published[0].request_type
}

#[tokio::test]
async fn member_events_trigger_ssh_keys() {
    let rt = classify_one("io.libops.project.member.created.v1", ScopeIds::project(1, 2)).await;
    assert_eq!(rt, RequestType::SshKeys);
}

#[tokio::test]
async fn secret_events_trigger_secrets() {
    let rt = classify_one("io.libops.project.secret.created.v1", ScopeIds::project(1, 2)).await;
    assert_eq!(rt, RequestType::Secrets);
}

#[tokio::test]
async fn firewall_events_trigger_firewall() {
    let rt = classify_one("io.libops.site.firewall.created.v1", ScopeIds::site(1, 2, 3)).await;
    assert_eq!(rt, RequestType::Firewall);
}

#[tokio::test]
async fn deployment_events_trigger_deployment() {
    let rt = classify_one("io.libops.site.deployment.requested.v1", ScopeIds::site(1, 2, 3)).await;
    assert_eq!(rt, RequestType::Deployment);
}

#[tokio::test]
async fn resource_level_updates_trigger_full() {
    let rt = classify_one("io.libops.organization.updated.v1", ScopeIds::organization(1)).await;
    assert_eq!(rt, RequestType::Full);
}

#[tokio::test]
async fn mixed_group_emits_one_request_per_category() {
    let mut h = PipelineHarness::new();
    h.enqueue("io.libops.site.member.created.v1", ScopeIds::site(1, 2, 3));
    h.enqueue("io.libops.site.firewall.created.v1", ScopeIds::site(1, 2, 3));

    h.settle(7_000, 1_000).await;

    let mut types: Vec<RequestType> =
        h.publisher.published().iter().map(|r| r.request_type).collect();
    types.sort();
    assert_eq!(types, vec![RequestType::SshKeys, RequestType::Firewall]);
}

#[tokio::test]
async fn full_subsumes_specific_categories_in_a_group() {
    let mut h = PipelineHarness::new();
    h.enqueue("io.libops.site.member.created.v1", ScopeIds::site(1, 2, 3));
    h.enqueue("io.libops.site.secret.created.v1", ScopeIds::site(1, 2, 3));
    h.enqueue("io.libops.site.updated.v1", ScopeIds::site(1, 2, 3));

    h.settle(7_000, 1_000).await;

    let published = h.publisher.published();
    assert_eq!(published.len(), 1, "full subsumes member + secret");
    assert_eq!(published[0].request_type, RequestType::Full);
    assert_eq!(published[0].event_ids.len(), 3);
}
