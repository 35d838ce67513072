//! Dead-letter specs
//!
//! A persistently failing bus walks an event through its full retry budget
//! and parks it in the terminal dead_letter state with the last error.

use crate::prelude::*;
use libops_core::{EventStatus, ScopeIds};

#[tokio::test]
async fn bus_outage_dead_letters_after_max_retries() {
    let mut h = PipelineHarness::new();
    h.publisher.fail_always();

    let row = h.enqueue("io.libops.site.updated.v1", ScopeIds::site(1, 2, 3));

    // Enough simulated time for five claim/debounce/publish attempts.
    h.settle(60_000, 1_000).await;

    let queue = h.queue.lock();
    let record = queue.get(row).unwrap();
    assert_eq!(record.status, EventStatus::DeadLetter);
    assert_eq!(record.retry_count, 5);
    let last_error = record.last_error.as_deref().unwrap();
    assert!(last_error.contains("bus unavailable"), "got: {last_error}");

    assert!(h.publisher.published().is_empty());
}

#[tokio::test]
async fn dead_letter_is_terminal_across_recovery() {
    let mut h = PipelineHarness::new();
    h.publisher.fail_always();
    let row = h.enqueue("io.libops.site.updated.v1", ScopeIds::site(1, 2, 3));
    h.settle(60_000, 1_000).await;
    assert_eq!(h.status_of(row), EventStatus::DeadLetter);

    // The bus comes back; the dead-lettered row stays parked. Operator
    // intervention, not the loop, resurrects dead letters.
    h.publisher.recover();
    h.settle(30_000, 1_000).await;

    assert_eq!(h.status_of(row), EventStatus::DeadLetter);
    assert!(h.publisher.published().is_empty());
}

#[tokio::test]
async fn transient_outage_is_invisible_after_recovery() {
    let mut h = PipelineHarness::new();
    h.publisher.fail_times(2);

    let row = h.enqueue("io.libops.site.updated.v1", ScopeIds::site(1, 2, 3));
    h.settle(60_000, 1_000).await;

    assert_eq!(h.status_of(row), EventStatus::Sent);
    assert_eq!(h.publisher.published().len(), 1);

    let queue = h.queue.lock();
    let record = queue.get(row).unwrap();
    assert_eq!(record.retry_count, 2, "both failed attempts are on record");
}
