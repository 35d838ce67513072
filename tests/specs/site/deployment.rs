//! Deployment reconciliation specs
//!
//! The commit-sha guard: a pinned deployment whose checkout lands on a
//! different HEAD fails before touching containers, and the failure is
//! reported under its deployment id.

use crate::prelude::*;
use libops_core::test_support::deployment_spec;
use libops_wire::ReportStatus;

#[tokio::test]
async fn sha_mismatch_fails_and_reports_failed() {
    let h = SiteHarness::new();
    let mut spec = deployment_spec(&h.dir.path().join("app").display().to_string());
    spec.git_ref = "main".to_string();
    spec.commit_sha = Some("deadbeef".repeat(5));
    h.admin.set_deployment(SITE_ID, spec);
    h.deploy.set_head_sha("0123abcd".repeat(5));

    let err = h.reconciler.deployment().await.unwrap_err();
    assert!(err.to_string().contains("deadbeef"));

    // Containers were never cycled.
    assert_eq!(h.deploy.calls(), vec!["sync_repo"]);

    // Both report surfaces carry the failure.
    let deployment_reports = h.admin.deployment_reports();
    assert_eq!(deployment_reports.len(), 1);
    assert_eq!(deployment_reports[0].0, "dep-test");
    assert_eq!(deployment_reports[0].1.status, ReportStatus::Failed);

    let site_reports = h.admin.site_reports();
    assert_eq!(site_reports.len(), 1);
    assert_eq!(site_reports[0].1.status, ReportStatus::Failed);
    assert_eq!(site_reports[0].1.resource_ids, vec!["dep-test".to_string()]);
}

#[tokio::test]
async fn matching_sha_deploys_and_reports_active() {
    let h = SiteHarness::new();
    let sha = "0123abcd".repeat(5);
    let mut spec = deployment_spec(&h.dir.path().join("app").display().to_string());
    spec.commit_sha = Some(sha.clone());
    spec.env.insert("PORT".to_string(), "8080".to_string());
    h.admin.set_deployment(SITE_ID, spec.clone());
    h.deploy.set_head_sha(sha);

    h.reconciler.deployment().await.unwrap();

    assert_eq!(h.deploy.calls(), vec!["sync_repo", "compose_pull", "compose_down", "compose_up"]);
    let env = std::fs::read_to_string(std::path::Path::new(&spec.path).join(".env")).unwrap();
    assert_eq!(env, "PORT=8080\n");

    let deployment_reports = h.admin.deployment_reports();
    assert_eq!(deployment_reports[0].1.status, ReportStatus::Active);
}

#[tokio::test]
async fn unpinned_deployment_takes_whatever_head_results() {
    let h = SiteHarness::new();
    let mut spec = deployment_spec(&h.dir.path().join("app").display().to_string());
    spec.commit_sha = None;
    h.admin.set_deployment(SITE_ID, spec);
    h.deploy.set_head_sha("anything".repeat(5));

    h.reconciler.deployment().await.unwrap();

    assert_eq!(h.admin.deployment_reports()[0].1.status, ReportStatus::Active);
}
