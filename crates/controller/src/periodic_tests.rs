// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Unit tests for the periodic loop

use super::*;
use crate::reconcile::{ApplySettings, HostDeps};
use libops_adapters::{FakeAdminAdapter, FakeDeployAdapter, FakeFilterAdapter, FakeUsersAdapter};
use libops_core::test_support::{deployment_spec, secret};
use libops_core::FakeClock;

/// Let the spawned loop run until the expected report count lands.
async fn wait_for_reports(admin: &FakeAdminAdapter, count: usize) {
    for _ in 0..100 {
        if admin.site_reports().len() >= count {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("expected {count} reports, got {}", admin.site_reports().len());
}

fn reconciler(
    dir: &tempfile::TempDir,
    admin: &FakeAdminAdapter,
    deploy: &FakeDeployAdapter,
) -> Arc<
    Reconciler<FakeAdminAdapter, FakeUsersAdapter, FakeFilterAdapter, FakeDeployAdapter, FakeClock>,
> {
    let settings = ApplySettings {
        home_root: dir.path().join("home"),
        exec_group: "docker".to_string(),
        secrets_path: dir.path().join("secrets.env"),
        firewall_chain: "LIBOPS-FIREWALL".to_string(),
    };
    Arc::new(Reconciler::new(
        3,
        admin.clone(),
        HostDeps {
            users: FakeUsersAdapter::new(),
            filter: FakeFilterAdapter::new(),
            deploy: deploy.clone(),
        },
        settings,
        FakeClock::new(),
    ))
}

#[tokio::test(start_paused = true)]
async fn first_pass_fires_immediately_then_on_interval() {
    let dir = tempfile::tempdir().unwrap();
    let admin = FakeAdminAdapter::new();
    admin.insert_chain(1, 2, 3);
    admin.set_secrets(3, vec![secret(1, "API_KEY", "hunter2")]);
    let deploy = FakeDeployAdapter::new();
    let cancel = CancellationToken::new();

    let handle = tokio::spawn(run(
        reconciler(&dir, &admin, &deploy),
        Duration::from_secs(12 * 3600),
        cancel.clone(),
    ));

    // Immediate pass: three reports (ssh_keys, secrets, firewall).
    wait_for_reports(&admin, 3).await;

    // One more pass after the interval.
    tokio::time::advance(Duration::from_secs(12 * 3600)).await;
    wait_for_reports(&admin, 6).await;
    cancel.cancel();
    handle.await.unwrap();
    assert_eq!(admin.site_reports().len(), 6);
}

#[tokio::test(start_paused = true)]
async fn periodic_pass_never_touches_deployment() {
    let dir = tempfile::tempdir().unwrap();
    let admin = FakeAdminAdapter::new();
    admin.insert_chain(1, 2, 3);
    admin.set_deployment(3, deployment_spec("/srv/app"));
    let deploy = FakeDeployAdapter::new();
    let cancel = CancellationToken::new();

    let handle = tokio::spawn(run(
        reconciler(&dir, &admin, &deploy),
        Duration::from_secs(12 * 3600),
        cancel.clone(),
    ));

    tokio::time::advance(Duration::from_secs(36 * 3600)).await;
    cancel.cancel();
    handle.await.unwrap();

    assert!(deploy.calls().is_empty());
}
