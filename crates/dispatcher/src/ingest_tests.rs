// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Unit tests for the ingest endpoint

use super::*;
use axum::body::Body;
use axum::http::Request;
use libops_adapters::FakeAdminAdapter;
use libops_core::FakeClock;
use libops_storage::{EventQueue, QueuePaths};
use parking_lot::Mutex;
use tower::util::ServiceExt;

struct Ctx {
    app: Router,
    queue: Arc<Mutex<EventQueue<FakeClock>>>,
    // NOTE(lifetime): tempdir removed on drop
    #[allow(dead_code)]
    dir: tempfile::TempDir,
}

fn setup(token: &str) -> Ctx {
    let dir = tempfile::tempdir().unwrap();
    let queue = Arc::new(Mutex::new(
        EventQueue::open(&QueuePaths::under(dir.path()), FakeClock::new()).unwrap(),
    ));
    let admin = FakeAdminAdapter::new();
    admin.insert_chain(1, 2, 3);
    let emitter = Emitter::new(Arc::clone(&queue), admin);
    let app = router(Arc::new(IngestState { emitter, token: token.to_string() }));
    Ctx { app, queue, dir }
}

fn event_body() -> String {
    serde_json::json!({
        "event_type": "io.libops.site.member.created.v1",
        "source": "io.libops.api",
        "subject": "member-42",
        "scope": "site",
        "id": 3,
        "payload": {"member_id": 42},
    })
    .to_string()
}

fn post_event(token: Option<&str>, body: String) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/events")
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body)).unwrap()
}

#[tokio::test]
async fn accepted_event_lands_in_queue() {
    let ctx = setup("");

    let response = ctx.app.clone().oneshot(post_event(None, event_body())).await.unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(ctx.queue.lock().stats().pending, 1);
}

#[tokio::test]
async fn auth_is_enforced_when_token_configured() {
    let ctx = setup("svc-token");

    let response = ctx.app.clone().oneshot(post_event(None, event_body())).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response =
        ctx.app.clone().oneshot(post_event(Some("wrong"), event_body())).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response =
        ctx.app.clone().oneshot(post_event(Some("svc-token"), event_body())).await.unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
}

#[tokio::test]
async fn unknown_scope_is_unprocessable() {
    let ctx = setup("");
    let body = serde_json::json!({
        "event_type": "io.libops.site.updated.v1",
        "source": "io.libops.api",
        "subject": "site-99",
        "scope": "site",
        "id": 99,
        "payload": {},
    })
    .to_string();

    let response = ctx.app.clone().oneshot(post_event(None, body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(ctx.queue.lock().stats().pending, 0);
}

#[tokio::test]
async fn health_endpoint_is_open() {
    let ctx = setup("svc-token");
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

    let response = ctx.app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
