use serde_json::json;

use super::message::{ClientFrame, Delivery};

#[test]
fn test_subscribe_frame_shape() {
    let frame = ClientFrame::Subscribe {
        topic: "requests/respond".to_string(),
    };
    let value = serde_json::to_value(&frame).unwrap();
    assert_eq!(
        value,
        json!({ "type": "subscribe", "topic": "requests/respond" })
    );
}

#[test]
fn test_publish_frame_shape() {
    let frame = ClientFrame::Publish {
        topic: "requests/identify".to_string(),
        payload: "{\"x\":1}".to_string(),
        timestamp: 1_725_000_000,
    };
    let value = serde_json::to_value(&frame).unwrap();
    assert_eq!(
        value,
        json!({
            "type": "publish",
            "topic": "requests/identify",
            "payload": "{\"x\":1}",
            "timestamp": 1_725_000_000,
        })
    );
}

#[test]
fn test_delivery_parses_broker_fanout() {
    let raw = r#"{"topic":"requests/respond","payload":"{\"correlation_id\":\"abc\"}","timestamp":1725000000}"#;
    let delivery: Delivery = serde_json::from_str(raw).unwrap();
    assert_eq!(delivery.topic, "requests/respond");
    assert!(delivery.payload.contains("correlation_id"));
    assert_eq!(delivery.timestamp, 1_725_000_000);
}

#[test]
fn test_delivery_rejects_missing_fields() {
    let raw = r#"{"topic":"requests/respond"}"#;
    assert!(serde_json::from_str::<Delivery>(raw).is_err());
}
