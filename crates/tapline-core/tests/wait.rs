//! Wait engine tests against the in-memory session, with paused time.

mod common;

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use common::{actor_on, button, full_hd, target, with};

use tapline_core::error::InteractionError;
use tapline_core::wait::{Wait, WaitCondition};

// ---------------------------------------------------------------------------
// 1. Fixed delay
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_fixed_delay_sleeps_without_queries() {
    let session = full_hd();
    let mut actor = actor_on(&session);

    let start = Instant::now();
    actor.attempts_to(&Wait::for_millis(200)).await.unwrap();

    assert!(start.elapsed() >= Duration::from_millis(200));
    assert_eq!(session.query_count(), 0);
    assert_eq!(session.gesture_count(), 0);
}

// ---------------------------------------------------------------------------
// 2. Element conditions
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_until_visible_times_out_at_deadline() {
    let spinner = target("spinner", "spinner");
    let session = with(full_hd(), &spinner, button().hidden());
    let mut actor = actor_on(&session);

    let start = Instant::now();
    let err = actor
        .attempts_to(&Wait::until_visible_within(spinner, Duration::from_secs(1)))
        .await
        .unwrap_err();
    let elapsed = start.elapsed();

    match &err {
        InteractionError::WaitTimeoutExceeded {
            condition,
            target,
            timeout,
            ..
        } => {
            assert_eq!(*condition, WaitCondition::Visible);
            assert_eq!(target.as_deref(), Some("spinner"));
            assert_eq!(*timeout, Duration::from_secs(1));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(elapsed >= Duration::from_secs(1), "gave up early: {elapsed:?}");
    assert!(elapsed < Duration::from_millis(1500), "overshot: {elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn test_until_visible_succeeds_when_element_shows() {
    let toast = target("saved toast", "toast");
    let session = with(full_hd(), &toast, button().hidden());
    let mut actor = actor_on(&session);

    let background = session.clone();
    let locator = toast.locator().clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(1200)).await;
        background.update_element(&locator, |el| el.displayed = true);
    });

    let start = Instant::now();
    actor.attempts_to(&Wait::until_visible(toast)).await.unwrap();
    let elapsed = start.elapsed();

    assert!(elapsed >= Duration::from_millis(1200));
    assert!(elapsed < Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn test_until_present_ignores_visibility() {
    let row = target("hidden row", "row");
    let session = full_hd();
    let mut actor = actor_on(&session);

    let background = session.clone();
    let locator = row.locator().clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        background.set_element(locator, button().hidden());
    });

    actor.attempts_to(&Wait::until_present(row)).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_until_invisible_accepts_removed_element() {
    let spinner = target("spinner", "spinner");
    let session = with(full_hd(), &spinner, button());
    let mut actor = actor_on(&session);

    let background = session.clone();
    let locator = spinner.locator().clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(700)).await;
        background.remove_element(&locator);
    });

    actor.attempts_to(&Wait::until_invisible(spinner)).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_until_clickable_waits_for_enabled() {
    let submit = target("submit", "submit");
    let session = with(full_hd(), &submit, button().disabled());
    let mut actor = actor_on(&session);

    let background = session.clone();
    let locator = submit.locator().clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(900)).await;
        background.update_element(&locator, |el| el.enabled = true);
    });

    actor
        .attempts_to(&Wait::until_clickable_within(submit, Duration::from_secs(2)))
        .await
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_until_text_appears_matches_substring() {
    let status = target("status label", "status");
    let session = with(full_hd(), &status, button().with_text("Loading"));
    let mut actor = actor_on(&session);

    let background = session.clone();
    let locator = status.locator().clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(600)).await;
        background.update_element(&locator, |el| el.text = "Upload Done!".to_string());
    });

    actor
        .attempts_to(&Wait::until_text_appears(status, "Done"))
        .await
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_until_selected_times_out_with_custom_poll() {
    let toggle = target("dark mode", "dark-mode");
    let session = with(full_hd(), &toggle, button());
    let mut actor = actor_on(&session);

    let err = actor
        .attempts_to(
            &Wait::until_selected_within(toggle, Duration::from_millis(500))
                .with_poll_interval(Duration::from_millis(100)),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, InteractionError::WaitTimeoutExceeded { .. }));
    // Six polls: 0, 100, 200, 300, 400 and 500 ms; each is a lookup and a state query.
    assert_eq!(session.query_count(), 12);
}

// ---------------------------------------------------------------------------
// 3. Configuration and faults
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_element_condition_without_target_is_rejected_before_queries() {
    let session = full_hd();
    let mut actor = actor_on(&session);

    let err = actor
        .attempts_to(&Wait::new(WaitCondition::Visible, None, Duration::from_secs(1)))
        .await
        .unwrap_err();

    assert!(matches!(err, InteractionError::InvalidConfiguration { .. }));
    assert_eq!(session.query_count(), 0);
}

#[tokio::test]
async fn test_unrepresentable_timeout_is_rejected_before_queries() {
    let spinner = target("spinner", "spinner");
    let session = with(full_hd(), &spinner, button());
    let mut actor = actor_on(&session);

    let err = actor
        .attempts_to(&Wait::until_invisible_within(spinner, Duration::MAX))
        .await
        .unwrap_err();

    assert!(matches!(err, InteractionError::InvalidConfiguration { .. }));
    assert!(err.to_string().contains("out of range"));
    assert_eq!(session.query_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_session_fault_is_not_swallowed() {
    let spinner = target("spinner", "spinner");
    let session = full_hd();
    session.fail_lookups(Some("session gone"));
    let mut actor = actor_on(&session);

    let err = actor
        .attempts_to(&Wait::until_invisible(spinner))
        .await
        .unwrap_err();
    assert!(matches!(err, InteractionError::Session { .. }));
}

// ---------------------------------------------------------------------------
// 4. Cancellation
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_cancel_interrupts_fixed_delay() {
    let session = full_hd();
    let token = CancellationToken::new();
    let mut actor = actor_on(&session).with_cancellation(token.clone());

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        token.cancel();
    });

    let start = Instant::now();
    let err = actor.attempts_to(&Wait::for_seconds(10)).await.unwrap_err();

    assert!(err.is_cancelled());
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn test_cancel_interrupts_polling() {
    let spinner = target("spinner", "spinner");
    let session = with(full_hd(), &spinner, button());
    let token = CancellationToken::new();
    token.cancel();
    let mut actor = actor_on(&session).with_cancellation(token);

    let err = actor
        .attempts_to(&Wait::until_invisible(spinner))
        .await
        .unwrap_err();
    assert!(matches!(err, InteractionError::Cancelled { interaction: "wait" }));
    // One poll ran before the first pause observed the token.
    assert_eq!(session.query_count(), 2);
}
