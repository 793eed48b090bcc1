//! The `transport` module handles network communication with the broker
//! over WebSockets.
//!
//! It defines the wire frames exchanged with the broker and the
//! `WsConnection` adapter, which turns a socket into a frame sender plus
//! a stream of inbound deliveries. Everything above this module is
//! transport-agnostic: the session and correlator only ever see topics
//! and payload strings.

pub mod message;
pub mod websocket;

pub use message::{ClientFrame, Delivery};
pub use websocket::WsConnection;

#[cfg(test)]
mod tests;
