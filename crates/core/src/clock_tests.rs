// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Unit tests for the clock abstraction

use super::*;

#[test]
fn fake_clock_advances_instant_and_epoch_together() {
    let clock = FakeClock::new();
    let start_instant = clock.now();
    let start_ms = clock.epoch_ms();

    clock.advance(Duration::from_secs(5));

    assert_eq!(clock.now() - start_instant, Duration::from_secs(5));
    assert_eq!(clock.epoch_ms(), start_ms + 5_000);
}

#[test]
fn fake_clock_advance_ms_matches_advance() {
    let a = FakeClock::new();
    let b = FakeClock::new();
    a.set_epoch_ms(7_000);
    b.set_epoch_ms(7_000);

    a.advance(Duration::from_millis(250));
    b.advance_ms(250);

    assert_eq!(a.epoch_ms(), b.epoch_ms());
}

#[test]
fn fake_clock_clones_share_state() {
    let clock = FakeClock::new();
    let other = clock.clone();

    clock.advance_ms(1_500);

    assert_eq!(other.epoch_ms(), clock.epoch_ms());
}

#[test]
fn timestamp_reflects_epoch_ms() {
    let clock = FakeClock::new();
    clock.set_epoch_ms(1_700_000_000_000);

    let ts = clock.timestamp();

    assert_eq!(ts.timestamp_millis(), 1_700_000_000_000);
}

#[test]
fn system_clock_epoch_is_sane() {
    let clock = SystemClock;
    // Any time after 2023-01-01 counts as sane for a wall clock.
    assert!(clock.epoch_ms() > 1_672_531_200_000);
}
