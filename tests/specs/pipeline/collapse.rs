//! Collapse specs
//!
//! A burst of events on one scope inside a debounce window becomes exactly
//! one outbound reconciliation carrying every collapsed event id.

use crate::prelude::*;
use libops_core::{EventStatus, ScopeIds};

#[tokio::test]
async fn three_org_updates_within_half_a_second_collapse_to_one_message() {
    let mut h = PipelineHarness::new();

    // Three organization.updated events for org 1 within 500ms.
    let mut rows = Vec::new();
    for _ in 0..3 {
        rows.push(h.enqueue("io.libops.organization.updated.v1", ScopeIds::organization(1)));
        h.clock.advance_ms(250);
    }

    // Give the loop four seconds of simulated time.
    h.settle(4_000, 1_000).await;

    let published = h.publisher.published();
    assert_eq!(published.len(), 1, "exactly one outbound message");
    assert_eq!(published[0].request_type, RequestType::Full);
    assert_eq!(published[0].event_ids.len(), 3);

    // The message's event_ids are a permutation of the three enqueued ones.
    let queue = h.queue.lock();
    let mut expected: Vec<uuid::Uuid> =
        rows.iter().map(|r| queue.get(*r).unwrap().event_id).collect();
    let mut actual = published[0].event_ids.clone();
    expected.sort();
    actual.sort();
    assert_eq!(actual, expected);

    for row in &rows {
        assert_eq!(queue.get(*row).unwrap().status, EventStatus::Sent);
    }
}

#[tokio::test]
async fn events_in_separate_windows_publish_separately() {
    let mut h = PipelineHarness::new();

    h.enqueue("io.libops.organization.updated.v1", ScopeIds::organization(1));
    h.settle(3_000, 1_000).await;
    assert_eq!(h.publisher.published().len(), 1);

    // Well past the first window: a second burst gets its own message.
    h.enqueue("io.libops.organization.updated.v1", ScopeIds::organization(1));
    h.settle(3_000, 1_000).await;
    assert_eq!(h.publisher.published().len(), 2);
}

#[tokio::test]
async fn collapsed_batch_acknowledges_atomically() {
    let mut h = PipelineHarness::new();
    let rows: Vec<u64> = (0..5)
        .map(|_| h.enqueue("io.libops.site.secret.updated.v1", ScopeIds::site(1, 2, 3)))
        .collect();

    h.settle(7_000, 1_000).await;

    // One secrets message; every row moved to sent together.
    assert_eq!(h.publisher.published().len(), 1);
    for row in rows {
        assert_eq!(h.status_of(row), EventStatus::Sent);
    }
}
