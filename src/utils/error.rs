//! The `error` module defines the error types surfaced by `reqsub`.
//!
//! Transport-boundary failures (`ConnectError`, `SubscribeError`,
//! `PublishError`) are handled by the connection manager, which decides
//! between retry and giving up. Request-level failures (`RequestError`)
//! surface directly to the caller of `Session::call`.

use std::fmt;

use thiserror::Error;

/// Failure to establish a WebSocket connection to the broker.
#[derive(Debug, Error)]
#[error("failed to connect to {url}: {source}")]
pub struct ConnectError {
    pub url: String,
    #[source]
    pub source: tungstenite::Error,
}

/// Failure to subscribe to a topic on the live connection.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SubscribeError {
    #[error("not connected to the broker")]
    NotConnected,

    /// The connection's send loop has ended; the socket is effectively dead.
    #[error("connection send loop has shut down")]
    ChannelClosed,
}

/// Failure to publish a message on the live connection.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PublishError {
    #[error("not connected to the broker")]
    NotConnected,

    /// The connection's send loop has ended; the socket is effectively dead.
    #[error("connection send loop has shut down")]
    ChannelClosed,
}

/// A correlation identifier was registered while a pending request with the
/// same identifier was still outstanding. This is a programming or
/// configuration error and is never retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("correlation id {0:?} already has a pending request")]
pub struct DuplicateCorrelation(pub String);

/// Why an in-flight request was cancelled before it could resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// The connection to the broker dropped while the request was pending.
    Disconnect,
    /// The client was shut down.
    Shutdown,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::Disconnect => write!(f, "disconnect"),
            CancelReason::Shutdown => write!(f, "shutdown"),
        }
    }
}

/// The outcome of a failed `Session::call`.
#[derive(Debug, Error)]
pub enum RequestError {
    /// No response arrived before the deadline. This is an expected
    /// operational outcome; the pending slot is removed, so a late
    /// response is silently dropped.
    #[error("no response before the deadline")]
    Timeout,

    /// The request was invalidated while in flight.
    #[error("request cancelled: {reason}")]
    Cancelled { reason: CancelReason },

    /// The request could not be published in the first place.
    #[error("failed to publish request: {0}")]
    Failed(#[from] PublishError),

    #[error(transparent)]
    Duplicate(#[from] DuplicateCorrelation),
}
