// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Unit tests for push handling and scope fan-out

use super::*;
use crate::controller_client::FakeControllerClient;
use chrono::Utc;
use libops_adapters::FakeAdminAdapter;
use libops_core::{RequestType, SiteStatus};
use uuid::Uuid;

fn request_for(
    site: Option<Uuid>,
    project: Option<Uuid>,
    org: Option<Uuid>,
    request_type: RequestType,
) -> PushRequest {
    PushRequest {
        site_public_id: site,
        project_public_id: project,
        org_public_id: org,
        request_type,
        event_ids: vec![Uuid::new_v4()],
        timestamp: Utc::now(),
    }
}

fn envelope(request: &PushRequest) -> PushEnvelope {
    PushEnvelope::wrap(request, "msg-1", "reconcile-sub").unwrap()
}

#[tokio::test]
async fn site_scoped_push_reaches_exactly_that_site() {
    let admin = FakeAdminAdapter::new();
    let (_, _, site) = admin.insert_chain(1, 2, 3);
    admin.insert_chain(1, 2, 4);
    let controllers = FakeControllerClient::new();

    let request = request_for(Some(site.public_id), None, None, RequestType::SshKeys);
    let outcome = handle_push(&admin, &controllers, &envelope(&request)).await;

    assert_eq!(outcome, PushOutcome::Delivered { forwarded: 1, skipped: 0 });
    let calls = controllers.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, site.external_address.unwrap());
    assert_eq!(calls[0].1.request_type, RequestType::SshKeys);
}

#[tokio::test]
async fn project_scoped_push_fans_out_to_all_project_sites() {
    let admin = FakeAdminAdapter::new();
    let (_, project, _) = admin.insert_chain(1, 2, 3);
    admin.insert_chain(1, 2, 4);
    admin.insert_chain(9, 8, 7); // unrelated
    let controllers = FakeControllerClient::new();

    let request = request_for(None, Some(project.public_id), None, RequestType::Full);
    let outcome = handle_push(&admin, &controllers, &envelope(&request)).await;

    assert_eq!(outcome, PushOutcome::Delivered { forwarded: 2, skipped: 0 });
}

#[tokio::test]
async fn org_scoped_push_covers_all_descendant_sites() {
    let admin = FakeAdminAdapter::new();
    let (org, _, _) = admin.insert_chain(1, 2, 3);
    admin.insert_chain(1, 5, 6); // second project in the org
    let controllers = FakeControllerClient::new();

    let request = request_for(None, None, Some(org.public_id), RequestType::Secrets);
    let outcome = handle_push(&admin, &controllers, &envelope(&request)).await;

    assert_eq!(outcome, PushOutcome::Delivered { forwarded: 2, skipped: 0 });
}

#[tokio::test]
async fn unaddressable_site_is_skipped_and_acked() {
    let admin = FakeAdminAdapter::new();
    let (_, _, mut site) = admin.insert_chain(1, 2, 3);
    site.external_address = None;
    site.status = SiteStatus::Provisioning;
    admin.upsert_site(site.clone());
    let controllers = FakeControllerClient::new();

    let request = request_for(Some(site.public_id), None, None, RequestType::Full);
    let outcome = handle_push(&admin, &controllers, &envelope(&request)).await;

    assert_eq!(outcome, PushOutcome::Delivered { forwarded: 0, skipped: 1 });
    assert!(controllers.calls().is_empty());
}

#[tokio::test]
async fn vanished_site_is_acked() {
    let admin = FakeAdminAdapter::new();
    let controllers = FakeControllerClient::new();

    let request = request_for(Some(Uuid::new_v4()), None, None, RequestType::Full);
    let outcome = handle_push(&admin, &controllers, &envelope(&request)).await;

    assert_eq!(outcome, PushOutcome::Delivered { forwarded: 0, skipped: 0 });
}

#[tokio::test]
async fn controller_failure_requests_redelivery() {
    let admin = FakeAdminAdapter::new();
    let (_, project, _) = admin.insert_chain(1, 2, 3);
    let (_, _, site_b) = admin.insert_chain(1, 2, 4);
    let controllers = FakeControllerClient::new();
    controllers.fail_address(site_b.external_address.as_deref().unwrap());

    let request = request_for(None, Some(project.public_id), None, RequestType::Full);
    let outcome = handle_push(&admin, &controllers, &envelope(&request)).await;

    assert!(matches!(outcome, PushOutcome::Retry(_)));
    // The healthy sibling still got its call before the nack.
    assert_eq!(controllers.calls().len(), 1);
}

#[tokio::test]
async fn admin_outage_requests_redelivery() {
    let admin = FakeAdminAdapter::new();
    admin.insert_chain(1, 2, 3);
    admin.fail_with("admin down");
    let controllers = FakeControllerClient::new();

    let request = request_for(Some(Uuid::new_v4()), None, None, RequestType::Full);
    let outcome = handle_push(&admin, &controllers, &envelope(&request)).await;

    assert!(matches!(outcome, PushOutcome::Retry(_)));
}

#[tokio::test]
async fn garbage_payload_is_malformed_not_retried() {
    let admin = FakeAdminAdapter::new();
    let controllers = FakeControllerClient::new();

    let request = request_for(Some(Uuid::new_v4()), None, None, RequestType::Full);
    let mut envelope = envelope(&request);
    envelope.message.data = "!!!".to_string();

    let outcome = handle_push(&admin, &controllers, &envelope).await;
    assert!(matches!(outcome, PushOutcome::Malformed(_)));
}
