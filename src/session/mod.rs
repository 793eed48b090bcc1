//! The `session` module orchestrates one correlated request/response
//! exchange: generate a token, register it, publish, await the outcome.
//!
//! A `Session` is one logical client identity talking to the broker. Any
//! number of tasks may call [`Session::call`] concurrently; requests are
//! matched to responses strictly by correlation token, never by arrival
//! order.

pub mod token;

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::time::Instant;
use tracing::debug;

use crate::correlator::{Correlator, Response};
use crate::utils::error::{PublishError, RequestError};

pub use token::{JsonField, TokenScheme, fresh_token};

/// The publish capability a session needs from the connection layer.
///
/// Kept as a trait so tests can drive a session against a fake bus
/// without any socket.
pub trait Publisher: Send + Sync {
    fn publish(&self, topic: &str, payload: String) -> Result<(), PublishError>;
}

/// A request/response session bound to one publisher and one correlator.
pub struct Session {
    publisher: Arc<dyn Publisher>,
    correlator: Correlator,
    scheme: Arc<dyn TokenScheme>,
    default_timeout: Duration,
}

impl Session {
    pub fn new(
        publisher: Arc<dyn Publisher>,
        correlator: Correlator,
        scheme: Arc<dyn TokenScheme>,
        default_timeout: Duration,
    ) -> Self {
        Self {
            publisher,
            correlator,
            scheme,
            default_timeout,
        }
    }

    /// Publish a request on `topic` and await its correlated response.
    ///
    /// Registration happens before publish so a response racing a slow
    /// publish is never missed. If the publish itself fails, the slot is
    /// unregistered again and the call fails immediately; nothing leaks.
    /// The call suspends only while awaiting — never while publishing.
    pub async fn call(
        &self,
        topic: &str,
        payload: Value,
        timeout: Option<Duration>,
    ) -> Result<Response, RequestError> {
        let token = fresh_token();
        let deadline = Instant::now() + timeout.unwrap_or(self.default_timeout);

        let handle = self.correlator.register(&token, deadline)?;
        let body = self.scheme.embed(&token, &payload);

        if let Err(e) = self.publisher.publish(topic, body.to_string()) {
            self.correlator.unregister(&token);
            return Err(RequestError::Failed(e));
        }
        debug!("published request {token} on {topic}");

        handle.wait().await
    }
}
