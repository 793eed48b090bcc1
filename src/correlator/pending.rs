use tokio::sync::oneshot;
use tokio::time::{Instant, timeout_at};

use crate::correlator::Correlator;
use crate::utils::error::{CancelReason, RequestError};

/// Opaque correlation token embedded in a request and echoed in its
/// response.
pub type Token = String;

/// A matched response, consumed exactly once by its pending request.
#[derive(Debug, Clone)]
pub struct Response {
    pub token: Token,
    pub payload: serde_json::Value,
    pub received_at: i64,
}

/// The terminal value pushed into a pending slot. Timeouts are not sent
/// through the slot; the awaiting side declares them itself.
#[derive(Debug)]
pub(crate) enum Outcome {
    Delivered(Response),
    Cancelled(CancelReason),
}

/// What happened to an inbound response when it was offered to the
/// correlator. `NoSuchPending` is not an error: late and duplicate
/// deliveries are a normal consequence of at-least-once messaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Delivered,
    NoSuchPending,
}

/// The caller's side of one pending request slot.
///
/// Exactly one of three outcomes comes out of [`wait`](Self::wait): a
/// response, a timeout, or a cancellation. The slot itself lives in the
/// correlator's map until one of those outcomes removes it. Dropping the
/// handle without awaiting it unregisters the slot, so an abandoned call
/// future cannot leak a map entry.
#[derive(Debug)]
pub struct PendingHandle {
    pub(crate) token: Token,
    pub(crate) deadline: Instant,
    /// Taken exactly once by `wait`; still present on drop means the
    /// handle was abandoned and its slot must be cleaned up.
    pub(crate) rx: Option<oneshot::Receiver<Outcome>>,
    pub(crate) correlator: Correlator,
}

impl PendingHandle {
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Suspend until the request resolves, is cancelled, or the deadline
    /// passes.
    ///
    /// Removal from the correlator map is the single commit point. On
    /// timeout this side tries to remove the slot itself; if the slot is
    /// already gone, a resolve or cancellation committed strictly before
    /// the expiry was declared, and its outcome (already in the channel)
    /// wins. `timeout_at` also polls the slot before declaring expiry, so
    /// a response that lands before the deadline is never misreported as
    /// a timeout.
    pub async fn wait(mut self) -> Result<Response, RequestError> {
        let Some(mut rx) = self.rx.take() else {
            // Unreachable: `wait` consumes the handle and is the only
            // taker. Report it as a cancellation rather than panicking.
            return Err(RequestError::Cancelled {
                reason: CancelReason::Shutdown,
            });
        };

        match timeout_at(self.deadline, &mut rx).await {
            Ok(Ok(Outcome::Delivered(response))) => Ok(response),
            Ok(Ok(Outcome::Cancelled(reason))) => Err(RequestError::Cancelled { reason }),
            // Sender dropped without a value: the correlator is gone.
            Ok(Err(_)) => Err(RequestError::Cancelled {
                reason: CancelReason::Shutdown,
            }),
            Err(_) => {
                if self.correlator.unregister(&self.token) {
                    Err(RequestError::Timeout)
                } else {
                    // Lost the removal race: the slot was resolved or
                    // cancelled first, so take the committed outcome.
                    match rx.try_recv() {
                        Ok(Outcome::Delivered(response)) => Ok(response),
                        Ok(Outcome::Cancelled(reason)) => {
                            Err(RequestError::Cancelled { reason })
                        }
                        Err(_) => Err(RequestError::Timeout),
                    }
                }
            }
        }
    }
}

impl Drop for PendingHandle {
    fn drop(&mut self) {
        // Abandoned without being awaited: free the slot so the map
        // cannot grow with entries nobody will ever collect.
        if self.rx.is_some() {
            self.correlator.unregister(&self.token);
        }
    }
}
