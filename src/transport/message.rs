use serde::{Deserialize, Serialize};

/// Frames sent by the client to the broker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientFrame {
    #[serde(rename = "subscribe")]
    Subscribe { topic: String },

    #[serde(rename = "publish")]
    Publish {
        topic: String,
        payload: String,
        timestamp: i64,
    },
}

/// An inbound message fanned out by the broker to a subscriber.
///
/// The `payload` is an opaque JSON-encoded string; whether it carries a
/// correlation token is decided by the session's token scheme, not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Delivery {
    pub topic: String,
    pub payload: String,
    pub timestamp: i64,
}
