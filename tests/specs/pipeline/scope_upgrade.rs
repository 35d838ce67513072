//! Scope upgrade specs
//!
//! Overlapping scopes inside one debounce window escalate to the broadest
//! involved scope; one broad reconciliation replaces several narrow ones.

use crate::prelude::*;
use libops_core::{EventStatus, ScopeIds};

#[tokio::test]
async fn site_event_then_project_event_yields_one_project_request() {
    let mut h = PipelineHarness::new();

    let site_row = h.enqueue("io.libops.site.updated.v1", ScopeIds::site(1, 2, 3));
    h.dispatcher.tick().await.unwrap();

    // 500ms later the project-level change arrives.
    h.clock.advance_ms(500);
    let project_row = h.enqueue("io.libops.project.updated.v1", ScopeIds::project(1, 2));

    // Both rows are sent well within seven seconds.
    h.settle(6_500, 500).await;

    let published = h.publisher.published();
    assert_eq!(published.len(), 1, "one project-scoped message covers both");
    assert!(published[0].site_public_id.is_none());
    assert!(published[0].project_public_id.is_some());
    assert_eq!(published[0].event_ids.len(), 2);

    assert_eq!(h.status_of(site_row), EventStatus::Sent);
    assert_eq!(h.status_of(project_row), EventStatus::Sent);
}

#[tokio::test]
async fn full_ancestor_line_escalates_to_one_org_request() {
    let mut h = PipelineHarness::new();

    h.enqueue("io.libops.site.updated.v1", ScopeIds::site(1, 2, 3));
    h.enqueue("io.libops.project.updated.v1", ScopeIds::project(1, 2));
    h.enqueue("io.libops.organization.updated.v1", ScopeIds::organization(1));

    h.settle(6_000, 1_000).await;

    let published = h.publisher.published();
    assert_eq!(published.len(), 1, "site + project + org collapse to org scope");
    assert!(published[0].site_public_id.is_none());
    assert!(published[0].project_public_id.is_none());
    assert!(published[0].org_public_id.is_some());
    assert_eq!(published[0].event_ids.len(), 3);
}

#[tokio::test]
async fn unrelated_scopes_never_merge() {
    let mut h = PipelineHarness::new();
    h.admin.insert_chain(7, 8, 9);

    h.enqueue("io.libops.site.updated.v1", ScopeIds::site(1, 2, 3));
    h.enqueue("io.libops.site.updated.v1", ScopeIds::site(7, 8, 9));

    h.settle(7_000, 1_000).await;

    let published = h.publisher.published();
    assert_eq!(published.len(), 2, "disjoint ancestor lines stay separate");
}
