use std::time::Duration;

use serde_json::json;
use tokio::time::Instant;

use super::{Correlator, Resolution, Response};
use crate::utils::error::{CancelReason, RequestError};

fn response(token: &str, payload: serde_json::Value) -> Response {
    Response {
        token: token.to_string(),
        payload,
        received_at: chrono::Utc::now().timestamp_millis(),
    }
}

#[tokio::test]
async fn test_register_and_resolve_round_trip() {
    let correlator = Correlator::new();
    let handle = correlator
        .register("abc", Instant::now() + Duration::from_secs(5))
        .unwrap();

    let resolver = correlator.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        let outcome = resolver.resolve("abc", response("abc", json!({ "x": 1 })));
        assert_eq!(outcome, Resolution::Delivered);
    });

    let resolved = handle.wait().await.unwrap();
    assert_eq!(resolved.payload, json!({ "x": 1 }));
    assert_eq!(correlator.pending_count(), 0);
}

#[tokio::test]
async fn test_timeout_then_late_resolve_is_noop() {
    let correlator = Correlator::new();
    let handle = correlator
        .register("xyz", Instant::now() + Duration::from_millis(100))
        .unwrap();

    let err = handle.wait().await.unwrap_err();
    assert!(matches!(err, RequestError::Timeout));
    assert_eq!(correlator.pending_count(), 0);

    // A response after the deadline must not find a slot.
    let outcome = correlator.resolve("xyz", response("xyz", json!({ "late": true })));
    assert_eq!(outcome, Resolution::NoSuchPending);
}

#[test]
fn test_duplicate_register_rejected() {
    let correlator = Correlator::new();
    let deadline = Instant::now() + Duration::from_secs(5);
    let _handle = correlator.register("dup", deadline).unwrap();

    let err = correlator.register("dup", deadline).unwrap_err();
    assert_eq!(err.0, "dup");
    assert_eq!(correlator.pending_count(), 1);
}

#[tokio::test]
async fn test_duplicate_resolve_keeps_first_outcome() {
    let correlator = Correlator::new();
    let handle = correlator
        .register("once", Instant::now() + Duration::from_secs(5))
        .unwrap();

    assert_eq!(
        correlator.resolve("once", response("once", json!({ "first": true }))),
        Resolution::Delivered
    );
    // Duplicate delivery: dropped, no panic, no second outcome.
    assert_eq!(
        correlator.resolve("once", response("once", json!({ "second": true }))),
        Resolution::NoSuchPending
    );

    let resolved = handle.wait().await.unwrap();
    assert_eq!(resolved.payload, json!({ "first": true }));
}

#[tokio::test]
async fn test_cancel_all_fails_pending_promptly() {
    let correlator = Correlator::new();
    let deadline = Instant::now() + Duration::from_secs(30);
    let handles: Vec<_> = (0..5)
        .map(|i| correlator.register(&format!("req-{i}"), deadline).unwrap())
        .collect();

    correlator.cancel_all(CancelReason::Disconnect);

    // All five must observe the cancellation well before their deadlines.
    let all = async {
        for handle in handles {
            let err = handle.wait().await.unwrap_err();
            assert!(matches!(
                err,
                RequestError::Cancelled {
                    reason: CancelReason::Disconnect
                }
            ));
        }
    };
    tokio::time::timeout(Duration::from_secs(1), all)
        .await
        .expect("cancellation was not observed promptly");
    assert_eq!(correlator.pending_count(), 0);
}

#[tokio::test]
async fn test_unregister_prevents_resolution() {
    let correlator = Correlator::new();
    let _handle = correlator
        .register("gone", Instant::now() + Duration::from_secs(5))
        .unwrap();

    assert!(correlator.unregister("gone"));
    assert!(!correlator.unregister("gone"));
    assert_eq!(
        correlator.resolve("gone", response("gone", json!({}))),
        Resolution::NoSuchPending
    );
}

#[tokio::test]
async fn test_dropped_handle_frees_slot() {
    let correlator = Correlator::new();
    let handle = correlator
        .register("abandoned", Instant::now() + Duration::from_millis(10))
        .unwrap();

    // An un-awaited handle (e.g. a call future dropped by a select) must
    // not leave its slot behind.
    drop(handle);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(correlator.pending_count(), 0);
    assert_eq!(
        correlator.resolve("abandoned", response("abandoned", json!({}))),
        Resolution::NoSuchPending
    );
}

#[tokio::test]
async fn test_wait_after_resolution_leaves_token_reusable() {
    let correlator = Correlator::new();
    let handle = correlator
        .register("reuse", Instant::now() + Duration::from_secs(5))
        .unwrap();
    correlator.resolve("reuse", response("reuse", json!({ "n": 1 })));
    handle.wait().await.unwrap();

    // The consuming wait must not double-remove: the token is free again.
    assert_eq!(correlator.pending_count(), 0);
    let second = correlator
        .register("reuse", Instant::now() + Duration::from_secs(5))
        .unwrap();
    correlator.resolve("reuse", response("reuse", json!({ "n": 2 })));
    assert_eq!(second.wait().await.unwrap().payload, json!({ "n": 2 }));
}

#[tokio::test]
async fn test_resolve_committed_before_expired_deadline_wins() {
    let correlator = Correlator::new();
    // Deadline already reached when wait runs; the resolution below has
    // committed first and must win over the timeout.
    let handle = correlator.register("expired", Instant::now()).unwrap();
    assert_eq!(
        correlator.resolve("expired", response("expired", json!({ "won": true }))),
        Resolution::Delivered
    );

    let resolved = handle.wait().await.unwrap();
    assert_eq!(resolved.payload, json!({ "won": true }));
}

#[tokio::test]
async fn test_resolve_wins_when_before_deadline() {
    let correlator = Correlator::new();
    let handle = correlator
        .register("race", Instant::now() + Duration::from_millis(200))
        .unwrap();

    // Resolve strictly before the deadline; the waiter must see the
    // response even though the deadline is close.
    let outcome = correlator.resolve("race", response("race", json!({ "won": true })));
    assert_eq!(outcome, Resolution::Delivered);

    let resolved = handle.wait().await.unwrap();
    assert_eq!(resolved.payload, json!({ "won": true }));
}
