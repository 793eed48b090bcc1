//! The `correlator` module matches asynchronous, out-of-order responses
//! to the requests that caused them.
//!
//! Every outstanding request owns one pending slot, keyed by its
//! correlation token. A slot is resolved exactly once: by a matching
//! response, by its deadline passing, or by cancellation on disconnect.
//! Removal from the map is the atomic commit point — whichever outcome
//! removes the slot first wins, and the loser finds nothing to act on.

pub mod pending;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::debug;

use crate::utils::error::{CancelReason, DuplicateCorrelation};

pub use pending::{PendingHandle, Resolution, Response, Token};

use pending::Outcome;

/// Registry of pending request slots.
///
/// Cheap to clone; all clones share the same map. The map is touched by
/// caller tasks (register, timeout cleanup) and by the delivery pump
/// (resolve, cancel_all); the lock is never held across an await.
#[derive(Debug, Clone, Default)]
pub struct Correlator {
    slots: Arc<Mutex<HashMap<Token, oneshot::Sender<Outcome>>>>,
}

impl Correlator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pending slot for `token` with the given deadline.
    ///
    /// Fails if the token already has an outstanding slot; identifier
    /// uniqueness is enforced here, at creation.
    pub fn register(
        &self,
        token: &str,
        deadline: Instant,
    ) -> Result<PendingHandle, DuplicateCorrelation> {
        let mut slots = self.slots.lock().unwrap();
        if slots.contains_key(token) {
            return Err(DuplicateCorrelation(token.to_string()));
        }
        let (tx, rx) = oneshot::channel();
        slots.insert(token.to_string(), tx);
        Ok(PendingHandle {
            token: token.to_string(),
            deadline,
            rx: Some(rx),
            correlator: self.clone(),
        })
    }

    /// Offer an inbound response to the slot registered for its token.
    ///
    /// If no slot exists — never registered, already resolved, timed out,
    /// or cancelled — the response is dropped and `NoSuchPending` is
    /// returned. Callers treat that as a debug-level event, not an error.
    pub fn resolve(&self, token: &str, response: Response) -> Resolution {
        let mut slots = self.slots.lock().unwrap();
        match slots.remove(token) {
            Some(tx) => {
                // Send while still holding the lock so removal and
                // delivery commit together; a waiter that finds the slot
                // gone can rely on the outcome being in its channel.
                // oneshot send never blocks.
                let _ = tx.send(Outcome::Delivered(response));
                Resolution::Delivered
            }
            None => Resolution::NoSuchPending,
        }
    }

    /// Fail every outstanding slot with `reason`.
    ///
    /// Used when the connection drops or the client shuts down; blocked
    /// callers observe the cancellation immediately instead of waiting
    /// out their timeouts.
    pub fn cancel_all(&self, reason: CancelReason) {
        let drained: Vec<(Token, oneshot::Sender<Outcome>)> = {
            let mut slots = self.slots.lock().unwrap();
            slots.drain().collect()
        };
        if !drained.is_empty() {
            debug!("cancelling {} pending request(s): {reason}", drained.len());
        }
        for (_, tx) in drained {
            let _ = tx.send(Outcome::Cancelled(reason));
        }
    }

    /// Remove a slot without resolving it. Returns whether it existed.
    pub fn unregister(&self, token: &str) -> bool {
        self.slots.lock().unwrap().remove(token).is_some()
    }

    pub fn pending_count(&self) -> usize {
        self.slots.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests;
