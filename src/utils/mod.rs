//! The `utils` module collects shared pieces used across the client:
//! the error taxonomy and the tracing initialization helper.

pub mod error;
pub mod logging;
