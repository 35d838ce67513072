//! Stale-claim and crash recovery specs
//!
//! Claims orphaned by a dead dispatcher return to pending without a retry
//! penalty, and a re-opened queue resumes exactly where the WAL left off.

use crate::prelude::*;
use libops_adapters::{FakeAdminAdapter, FakePublishAdapter};
use libops_core::test_support::new_event;
use libops_core::{DispatcherId, EventStatus, FakeClock, ScopeIds};
use libops_dispatcher::{Dispatcher, Tuning};
use libops_storage::{EventQueue, QueuePaths};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn stale_claim_of_a_dead_dispatcher_is_recovered_and_republished() {
    let mut h = PipelineHarness::new();

    // A foreign dispatcher claimed the row, then died.
    let row = h.enqueue("io.libops.site.updated.v1", ScopeIds::site(1, 2, 3));
    h.queue.lock().claim(&DispatcherId::from_string("dsp-dead"), 5, 10).unwrap();
    assert_eq!(h.status_of(row), EventStatus::Processing);

    // Within the stale window nothing moves.
    h.settle(60_000, 5_000).await;
    assert_eq!(h.status_of(row), EventStatus::Processing);
    assert!(h.publisher.published().is_empty());

    // Past the five-minute window the surviving dispatcher recovers,
    // re-claims and publishes; retry_count stays untouched.
    h.clock.advance(Duration::from_secs(300));
    h.settle(10_000, 1_000).await;

    let queue = h.queue.lock();
    let record = queue.get(row).unwrap();
    assert_eq!(record.status, EventStatus::Sent);
    assert_eq!(record.retry_count, 0, "stale recovery never bumps retries");
    assert_eq!(h.publisher.published().len(), 1);
}

#[tokio::test]
async fn no_event_outlives_the_stale_window_in_processing() {
    let mut h = PipelineHarness::new();
    let row = h.enqueue("io.libops.site.updated.v1", ScopeIds::site(1, 2, 3));
    h.queue.lock().claim(&DispatcherId::from_string("dsp-dead"), 5, 10).unwrap();

    // One stale window plus one poll cycle later, the row is no longer
    // processing under the dead instance.
    h.clock.advance(Duration::from_secs(301));
    h.settle(10_000, 1_000).await;

    let queue = h.queue.lock();
    let record = queue.get(row).unwrap();
    assert_ne!(record.status, EventStatus::Processing);
}

#[tokio::test]
async fn queue_reopen_resumes_pending_work() {
    let dir = tempfile::tempdir().unwrap();
    let paths = QueuePaths::under(dir.path());
    let clock = FakeClock::new();
    clock.set_epoch_ms(1_000_000);

    // First process: enqueue and crash before dispatching.
    let row = {
        let mut queue = EventQueue::open(&paths, clock.clone()).unwrap();
        queue.enqueue(new_event("io.libops.organization.updated.v1", ScopeIds::organization(1)))
            .unwrap()
    };

    // Second process: open the same state dir and dispatch normally.
    let queue =
        Arc::new(Mutex::new(EventQueue::open(&paths, clock.clone()).unwrap()));
    let publisher = FakePublishAdapter::new();
    let admin = FakeAdminAdapter::new();
    admin.insert_chain(1, 2, 3);
    let mut dispatcher = Dispatcher::new(
        Arc::clone(&queue),
        publisher.clone(),
        admin,
        clock.clone(),
        Tuning::default(),
    );

    dispatcher.tick().await.unwrap();
    clock.advance_ms(2_500);
    dispatcher.tick().await.unwrap();

    assert_eq!(queue.lock().get(row).unwrap().status, EventStatus::Sent);
    assert_eq!(publisher.published().len(), 1);
}
