//! # ReqSub
//!
//! `reqsub` is a correlated request/response messaging client built on a
//! WebSocket pub/sub transport. It publishes a request carrying an opaque
//! correlation token and deterministically matches exactly one
//! asynchronous, possibly out-of-order response back to it, under
//! timeout, reconnect, and duplicate-delivery conditions.
//!
//! ## Core Modules
//!
//! The library is structured into several modules, each with a distinct responsibility:
//!
//! - `config`: Loads the operator surface — broker endpoint, client identity, topics, timeouts, reconnect policy.
//! - `correlator`: Maps outstanding requests to pending slots keyed by correlation token; each slot resolves exactly once.
//! - `session`: Orchestrates one publish-and-await exchange; owns the token embed/extract convention.
//! - `transport`: The WebSocket adapter — wire frames out, a delivery stream in.
//! - `lifecycle`: Connect/disconnect sequencing, reconnection with backoff, cancellation of in-flight requests on disconnect.
//! - `utils`: Shared error taxonomy and tracing setup.

pub mod config;
pub mod correlator;
pub mod lifecycle;
pub mod session;
pub mod transport;
pub mod utils;
