//! Error handling and edge case tests.

use crossbeam_channel::{bounded, unbounded};
use fanout::{CancelSource, JoinOptions, Registry, RegistryError};
use std::thread;
use std::time::{Duration, Instant};

fn wait_until(cond: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !cond() {
        assert!(Instant::now() < deadline, "condition not reached in time");
        thread::sleep(Duration::from_millis(1));
    }
}

// --- Validation ---

#[test]
fn test_join_without_token() {
    let registry: Registry<u32> = Registry::new();
    let (tx, _rx) = unbounded();

    let result = registry.join(&JoinOptions::new("c1").with_sink(tx));

    assert!(matches!(result, Err(RegistryError::InvalidArgument(_))));
    assert_eq!(registry.client_count(), 0);
}

#[test]
fn test_join_without_sink() {
    let registry: Registry<u32> = Registry::new();
    let source = CancelSource::new();

    let result = registry.join(&JoinOptions::new("c1").with_token(source.token()));

    assert!(matches!(result, Err(RegistryError::InvalidArgument(_))));
    assert_eq!(registry.client_count(), 0);
}

#[test]
fn test_join_without_anything() {
    let registry: Registry<u32> = Registry::new();

    let result = registry.join(&JoinOptions::new("c1"));

    assert!(matches!(result, Err(RegistryError::InvalidArgument(_))));
}

#[test]
fn test_invalid_join_leaves_existing_members_alone() {
    let registry: Registry<u32> = Registry::new();
    let source = CancelSource::new();
    let (tx, rx) = unbounded();
    let options = JoinOptions::new("c1").with_token(source.token()).with_sink(tx);

    let r = registry.clone();
    let handle = thread::spawn(move || r.join(&options));
    wait_until(|| registry.contains_client("c1"));

    let bad = registry.join(&JoinOptions::new("c1"));
    assert!(bad.is_err());
    assert_eq!(registry.subscriptions_for("c1"), 1);

    registry.send(&1, &["c1"]);
    assert_eq!(rx.recv_timeout(Duration::from_millis(200)).unwrap(), 1);

    source.cancel();
    handle.join().unwrap().unwrap();
}

#[test]
fn test_error_message_names_missing_input() {
    let registry: Registry<u32> = Registry::new();
    let (tx, _rx) = unbounded();

    let err = registry
        .join(&JoinOptions::new("c1").with_sink(tx))
        .unwrap_err();

    assert!(err.to_string().starts_with("Invalid argument"));
    assert!(err.to_string().contains("cancellation token"));
}

// --- Edge cases ---

#[test]
fn test_join_with_already_cancelled_token_returns() {
    let registry: Registry<u32> = Registry::new();
    let source = CancelSource::new();
    let (tx, _rx) = unbounded();
    source.cancel();

    registry
        .join(&JoinOptions::new("c1").with_token(source.token()).with_sink(tx))
        .unwrap();

    assert!(!registry.contains_client("c1"));
}

#[test]
fn test_dropped_source_ends_join() {
    let registry: Registry<u32> = Registry::new();
    let source = CancelSource::new();
    let (tx, _rx) = unbounded();
    let options = JoinOptions::new("c1").with_token(source.token()).with_sink(tx);

    let r = registry.clone();
    let handle = thread::spawn(move || r.join(&options));
    wait_until(|| registry.contains_client("c1"));

    drop(source);

    handle.join().unwrap().unwrap();
    assert!(!registry.contains_client("c1"));
}

#[test]
fn test_disconnected_sink_is_skipped_silently() {
    let registry: Registry<u32> = Registry::new();
    let source = CancelSource::new();
    // Rendezvous sink whose receiver is gone: delivery must fail fast
    let (tx, rx) = bounded(0);
    drop(rx);
    let options = JoinOptions::new("gone").with_token(source.token()).with_sink(tx);

    let r = registry.clone();
    let handle = thread::spawn(move || r.join(&options));
    wait_until(|| registry.contains_client("gone"));

    let (live_tx, live_rx) = unbounded();
    let live_source = CancelSource::new();
    let live = JoinOptions::new("live")
        .with_token(live_source.token())
        .with_sink(live_tx);
    let r = registry.clone();
    let live_handle = thread::spawn(move || r.join(&live));
    wait_until(|| registry.contains_client("live"));

    registry.broadcast(&9, &[] as &[&str]);
    assert_eq!(live_rx.recv_timeout(Duration::from_millis(200)).unwrap(), 9);

    // Still registered: only cancellation removes a subscription
    assert!(registry.contains_client("gone"));

    source.cancel();
    live_source.cancel();
    handle.join().unwrap().unwrap();
    live_handle.join().unwrap().unwrap();
    assert_eq!(registry.client_count(), 0);
}

#[test]
fn test_empty_client_id_is_a_regular_group() {
    let registry: Registry<u32> = Registry::new();
    let source = CancelSource::new();
    let (tx, rx) = unbounded();
    let options = JoinOptions::new("").with_token(source.token()).with_sink(tx);

    let r = registry.clone();
    let handle = thread::spawn(move || r.join(&options));
    wait_until(|| registry.contains_client(""));

    registry.send(&3, &[""]);
    assert_eq!(rx.recv_timeout(Duration::from_millis(200)).unwrap(), 3);

    source.cancel();
    handle.join().unwrap().unwrap();
}
