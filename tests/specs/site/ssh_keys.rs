//! SSH key reconciliation specs
//!
//! Converging twice with unchanged desired state is a byte-identical
//! no-op; removed members lose their account and home within one pass.

use crate::prelude::*;
use libops_core::test_support::member;
use libops_wire::ReportStatus;
use similar_asserts::assert_eq;
use uuid::Uuid;

#[tokio::test]
async fn reconciliation_is_idempotent_for_unchanged_members() {
    let h = SiteHarness::new();
    let u1 = Uuid::new_v4();
    h.admin.set_members(
        SITE_ID,
        vec![member(u1, &[("ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIFake u1@dev", "SHA256:abc")])],
    );

    h.reconciler.ssh_keys().await.unwrap();
    let keys_path = h.home_root().join(u1.to_string()).join(".ssh").join("authorized_keys");
    let first = std::fs::read_to_string(&keys_path).unwrap();

    h.reconciler.ssh_keys().await.unwrap();
    let second = std::fs::read_to_string(&keys_path).unwrap();

    assert_eq!(first, second, "second run must be byte-identical");
    assert_eq!(second.matches("ssh-ed25519").count(), 1, "key appears exactly once");
    assert!(second.contains("SHA256:abc"), "fingerprint comment present");

    // Both runs reported the member active.
    let reports = h.admin.site_reports();
    assert_eq!(reports.len(), 2);
    assert!(reports.iter().all(|(_, r)| r.status == ReportStatus::Active));
    assert!(reports.iter().all(|(_, r)| r.resource_ids == vec![u1.to_string()]));
}

#[tokio::test]
async fn removed_member_is_deleted_within_one_pass() {
    let h = SiteHarness::new();
    let keep = Uuid::new_v4();
    let gone = Uuid::new_v4();
    h.admin.set_members(
        SITE_ID,
        vec![
            member(keep, &[("ssh-ed25519 AAAA keep@dev", "SHA256:keep")]),
            member(gone, &[("ssh-ed25519 BBBB gone@dev", "SHA256:gone")]),
        ],
    );
    h.reconciler.ssh_keys().await.unwrap();
    assert!(h.home_root().join(gone.to_string()).exists());

    // The member disappears from desired state.
    h.admin.set_members(
        SITE_ID,
        vec![member(keep, &[("ssh-ed25519 AAAA keep@dev", "SHA256:keep")])],
    );
    h.reconciler.ssh_keys().await.unwrap();

    assert_eq!(h.users.removed(), vec![gone.to_string()]);
    assert!(!h.home_root().join(gone.to_string()).exists(), "home deleted with the account");
    assert!(h.home_root().join(keep.to_string()).exists());
}

#[tokio::test]
async fn key_rotation_rewrites_the_file() {
    let h = SiteHarness::new();
    let u1 = Uuid::new_v4();
    h.admin
        .set_members(SITE_ID, vec![member(u1, &[("ssh-ed25519 OLDKEY u1@dev", "SHA256:old")])]);
    h.reconciler.ssh_keys().await.unwrap();

    h.admin
        .set_members(SITE_ID, vec![member(u1, &[("ssh-ed25519 NEWKEY u1@dev", "SHA256:new")])]);
    h.reconciler.ssh_keys().await.unwrap();

    let keys_path = h.home_root().join(u1.to_string()).join(".ssh").join("authorized_keys");
    let content = std::fs::read_to_string(keys_path).unwrap();
    assert!(content.contains("NEWKEY"));
    assert!(!content.contains("OLDKEY"), "rotated key fully replaced");
}
