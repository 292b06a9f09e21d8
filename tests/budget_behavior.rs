//! Behavior-driven tests for the request budget
//!
//! These tests verify HOW the fixed-window budget admits and rejects outbound
//! chart calls as time moves, using a manual clock instead of real time.

use quotewire_core::{
    BudgetConfig, BudgetDecision, BudgetSnapshot, BudgetWindow, ManualClock, RequestBudget,
    SourceErrorKind,
};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn budget(minute_capacity: u32, day_capacity: u32) -> (Arc<ManualClock>, RequestBudget) {
    let clock = Arc::new(ManualClock::new());
    let budget = RequestBudget::with_clock(
        BudgetConfig {
            minute_capacity,
            day_capacity,
        },
        clock.clone(),
    );
    (clock, budget)
}

// =============================================================================
// Budget: Per-minute Window
// =============================================================================

#[test]
fn when_minute_capacity_is_used_up_further_calls_are_rejected() {
    // Given: A budget allowing 20 calls per minute
    let (clock, budget) = budget(20, 500);

    // When: 25 calls arrive within the same minute
    let decisions = (0..25)
        .map(|_| {
            clock.advance(Duration::from_secs(1));
            budget.check()
        })
        .collect::<Vec<_>>();

    // Then: The first 20 are accepted and the rest rejected on the minute window
    assert!(decisions[..20]
        .iter()
        .all(|decision| *decision == BudgetDecision::Accepted));
    assert!(decisions[20..]
        .iter()
        .all(|decision| *decision == BudgetDecision::Rejected(BudgetWindow::Minute)));
}

#[test]
fn when_sixty_seconds_pass_the_minute_window_resets() {
    // Given: A budget whose minute window is full
    let (clock, budget) = budget(3, 500);
    for _ in 0..3 {
        budget.acquire().expect("within capacity");
    }
    assert!(budget.acquire().is_err());

    // When: Exactly sixty seconds have passed since the window opened
    clock.advance(Duration::from_secs(60));

    // Then: The next call is accepted and starts a fresh count
    assert_eq!(budget.check(), BudgetDecision::Accepted);
    assert_eq!(
        budget.snapshot(),
        BudgetSnapshot {
            minute_count: 1,
            day_count: 4,
        }
    );
}

#[test]
fn when_window_has_not_fully_elapsed_calls_stay_rejected() {
    // Given: A full minute window
    let (clock, budget) = budget(1, 500);
    budget.acquire().expect("first call");

    // When: 59.999 seconds pass
    clock.advance(Duration::from_millis(59_999));

    // Then: The window has not rolled yet
    assert_eq!(budget.check(), BudgetDecision::Rejected(BudgetWindow::Minute));
}

// =============================================================================
// Budget: Daily Window
// =============================================================================

#[test]
fn when_daily_capacity_is_exhausted_minute_resets_do_not_help() {
    // Given: A budget of 2 per minute and 3 per day
    let (clock, budget) = budget(2, 3);

    // When: Calls are spread across several minutes
    budget.acquire().expect("call 1");
    budget.acquire().expect("call 2");
    clock.advance(Duration::from_secs(61));
    budget.acquire().expect("call 3");
    let fourth = budget.check();

    // Then: The daily window rejects even though the minute window has room
    assert_eq!(fourth, BudgetDecision::Rejected(BudgetWindow::Day));

    // And: The day window reopens after 24 hours
    clock.advance(Duration::from_secs(24 * 60 * 60));
    assert_eq!(budget.check(), BudgetDecision::Accepted);
}

// =============================================================================
// Budget: Rejection Semantics
// =============================================================================

#[test]
fn when_call_is_rejected_counts_are_unchanged() {
    // Given: A full minute window
    let (_clock, budget) = budget(2, 500);
    budget.acquire().expect("call 1");
    budget.acquire().expect("call 2");
    let before = budget.snapshot();

    // When: Several more calls are rejected
    for _ in 0..5 {
        let error = budget.acquire().expect_err("rejected");
        assert_eq!(error.kind(), SourceErrorKind::RateLimited);
    }

    // Then: Neither count moved
    assert_eq!(budget.snapshot(), before);
}

#[test]
fn when_rejected_user_sees_which_window_is_exhausted() {
    // Given: A full minute window
    let (_clock, budget) = budget(1, 500);
    budget.acquire().expect("call 1");

    // When: Another call arrives
    let error = budget.acquire().expect_err("rejected");

    // Then: The message names the per-minute budget
    assert!(error.message().contains("per-minute"), "{}", error.message());
    assert!(error.retryable());
}

// =============================================================================
// Budget: Concurrency
// =============================================================================

#[test]
fn when_many_threads_race_no_more_than_capacity_is_admitted() {
    // Given: A shared budget of 20 per minute
    let (_clock, budget) = budget(20, 500);
    let budget = Arc::new(budget);

    // When: 8 threads each attempt 10 calls
    let handles = (0..8)
        .map(|_| {
            let budget = Arc::clone(&budget);
            thread::spawn(move || {
                (0..10)
                    .filter(|_| budget.check() == BudgetDecision::Accepted)
                    .count()
            })
        })
        .collect::<Vec<_>>();
    let admitted: usize = handles
        .into_iter()
        .map(|handle| handle.join().expect("worker thread"))
        .sum();

    // Then: Exactly 20 calls were admitted
    assert_eq!(admitted, 20);
    assert_eq!(budget.snapshot().minute_count, 20);
}
