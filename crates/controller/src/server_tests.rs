// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Unit tests for the controller HTTP surface

use super::*;
use crate::reconcile::{ApplySettings, HostDeps};
use axum::body::Body;
use axum::http::Request;
use libops_adapters::{FakeAdminAdapter, FakeDeployAdapter, FakeFilterAdapter, FakeUsersAdapter};
use libops_core::test_support::secret;
use libops_core::FakeClock;
use tower::util::ServiceExt;

const SITE_ID: i64 = 3;

struct Ctx {
    app: Router,
    admin: FakeAdminAdapter,
    users: FakeUsersAdapter,
    // NOTE(lifetime): tempdir removed on drop
    #[allow(dead_code)]
    dir: tempfile::TempDir,
}

fn setup(token: &str, burst_only: Option<(u32, u32)>) -> Ctx {
    let dir = tempfile::tempdir().unwrap();
    let admin = FakeAdminAdapter::new();
    admin.insert_chain(1, 2, SITE_ID);
    let users = FakeUsersAdapter::new();

    let settings = ApplySettings {
        home_root: dir.path().join("home"),
        exec_group: "docker".to_string(),
        secrets_path: dir.path().join("secrets.env"),
        firewall_chain: "LIBOPS-FIREWALL".to_string(),
    };
    let reconciler = Reconciler::new(
        SITE_ID,
        admin.clone(),
        HostDeps {
            users: users.clone(),
            filter: FakeFilterAdapter::new(),
            deploy: FakeDeployAdapter::new(),
        },
        settings,
        FakeClock::new(),
    );

    let (per_second, burst) = burst_only.unwrap_or((10, 5));
    let state = Arc::new(ServerState {
        reconciler: Arc::new(reconciler),
        bucket: Mutex::new(TokenBucket::new(per_second, burst, Instant::now())),
        token: token.to_string(),
    });
    Ctx { app: router(state), admin, users, dir }
}

fn post_reconcile(kind: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri(format!("/reconcile/{kind}"));
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn secrets_endpoint_converges_and_reports() {
    let ctx = setup("", None);
    ctx.admin.set_secrets(SITE_ID, vec![secret(1, "API_KEY", "hunter2")]);

    let response = ctx.app.clone().oneshot(post_reconcile("secrets", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(ctx.dir.path().join("secrets.env").exists());
    assert_eq!(ctx.admin.site_reports().len(), 1);
}

#[tokio::test]
async fn failure_returns_500_with_text_body() {
    let ctx = setup("", None);
    ctx.admin.set_members(
        SITE_ID,
        vec![libops_core::test_support::member(
            uuid::Uuid::new_v4(),
            &[("ssh-ed25519 AAA x", "SHA256:x")],
        )],
    );
    ctx.users.fail_with("useradd broken");

    let response = ctx.app.clone().oneshot(post_reconcile("ssh-keys", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = axum::body::to_bytes(response.into_body(), 4096).await.unwrap();
    assert!(String::from_utf8_lossy(&body).contains("useradd broken"));
}

#[tokio::test]
async fn bearer_token_is_enforced() {
    let ctx = setup("platform-token", None);

    let response = ctx.app.clone().oneshot(post_reconcile("secrets", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response =
        ctx.app.clone().oneshot(post_reconcile("secrets", Some("wrong"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response =
        ctx.app.clone().oneshot(post_reconcile("secrets", Some("platform-token"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn unknown_kind_is_404() {
    let ctx = setup("", None);

    let response = ctx.app.clone().oneshot(post_reconcile("reboot", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn rate_limit_kicks_in_past_the_burst() {
    let ctx = setup("", Some((1, 1)));

    let mut statuses = Vec::new();
    for _ in 0..4 {
        let response =
            ctx.app.clone().oneshot(post_reconcile("secrets", None)).await.unwrap();
        statuses.push(response.status());
    }

    assert!(statuses.contains(&StatusCode::TOO_MANY_REQUESTS));
}

#[tokio::test]
async fn health_needs_no_token() {
    let ctx = setup("platform-token", None);
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

    let response = ctx.app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
