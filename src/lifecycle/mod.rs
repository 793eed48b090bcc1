//! The `lifecycle` module owns connect/disconnect sequencing and the
//! reconnection policy.
//!
//! The connection manager runs a supervisor task that cycles through
//! `Disconnected -> Connecting -> Connected` until an explicit
//! [`shutdown`](ConnectionManager::shutdown) moves it to the terminal
//! `Closed` state. On every (re)connect it re-subscribes all recorded
//! topics before the `Connected` state is published, so no call is
//! accepted against a connection that is missing subscriptions. When a
//! connection drops, every pending request is cancelled immediately
//! instead of waiting out its timeout.

pub mod backoff;

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::ReconnectSettings;
use crate::correlator::{Correlator, Resolution, Response};
use crate::session::{Publisher, TokenScheme};
use crate::transport::message::Delivery;
use crate::transport::websocket::WsConnection;
use crate::utils::error::{CancelReason, PublishError, SubscribeError};

pub use backoff::Backoff;

/// Connection lifecycle states. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Closed,
}

/// Supervises one broker connection on behalf of a client identity.
pub struct ConnectionManager {
    url: String,
    reconnect: ReconnectSettings,
    correlator: Correlator,
    scheme: Arc<dyn TokenScheme>,
    topics: Mutex<HashSet<String>>,
    conn: Mutex<Option<WsConnection>>,
    state_tx: watch::Sender<ConnectionState>,
    shutdown_tx: watch::Sender<bool>,
}

impl ConnectionManager {
    pub fn new(
        url: String,
        reconnect: ReconnectSettings,
        correlator: Correlator,
        scheme: Arc<dyn TokenScheme>,
    ) -> Arc<Self> {
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        let (shutdown_tx, _) = watch::channel(false);
        Arc::new(Self {
            url,
            reconnect,
            correlator,
            scheme,
            topics: Mutex::new(HashSet::new()),
            conn: Mutex::new(None),
            state_tx,
            shutdown_tx,
        })
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        *self.state_tx.borrow()
    }

    /// Watch lifecycle state transitions.
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    /// Record a topic subscription.
    ///
    /// The topic is re-subscribed on every reconnect. If a connection is
    /// live right now, the subscribe frame is also sent immediately.
    pub fn subscribe(&self, topic: &str) -> Result<(), SubscribeError> {
        self.topics.lock().unwrap().insert(topic.to_string());
        if let Some(conn) = self.conn.lock().unwrap().as_ref() {
            conn.subscribe(topic)?;
        }
        Ok(())
    }

    /// Spawn the supervisor task. Call once.
    pub fn start(self: &Arc<Self>) -> JoinHandle<()> {
        let manager = self.clone();
        tokio::spawn(async move { manager.run().await })
    }

    /// Suspend until the manager is `Connected` or `Closed`.
    pub async fn wait_connected(&self) -> ConnectionState {
        let mut rx = self.state_tx.subscribe();
        loop {
            let state = *rx.borrow_and_update();
            if matches!(state, ConnectionState::Connected | ConnectionState::Closed) {
                return state;
            }
            if rx.changed().await.is_err() {
                return ConnectionState::Closed;
            }
        }
    }

    /// Move to `Closed`, cancelling everything in flight. Idempotent.
    pub fn shutdown(&self) {
        if self.is_closed() {
            return;
        }
        info!("shutting down connection manager");
        self.shutdown_tx.send_replace(true);
        self.conn.lock().unwrap().take();
        self.correlator.cancel_all(CancelReason::Shutdown);
        self.state_tx.send_replace(ConnectionState::Closed);
    }

    fn is_closed(&self) -> bool {
        *self.shutdown_tx.borrow()
    }

    fn set_state(&self, state: ConnectionState) {
        self.state_tx.send_replace(state);
    }

    async fn run(self: Arc<Self>) {
        let mut shutdown = self.shutdown_tx.subscribe();
        let mut backoff = Backoff::new(
            Duration::from_millis(self.reconnect.initial_delay_ms),
            Duration::from_millis(self.reconnect.max_delay_ms),
        );
        let mut failures: u32 = 0;

        loop {
            if self.is_closed() {
                break;
            }
            self.set_state(ConnectionState::Connecting);
            debug!("connecting to {}", self.url);

            let attempt = tokio::select! {
                result = WsConnection::open(&self.url) => result,
                _ = shutdown.changed() => break,
            };

            match attempt {
                Ok((conn, mut deliveries)) => {
                    // Re-establish every recorded subscription before the
                    // Connected state becomes visible to callers.
                    let topics: Vec<String> =
                        self.topics.lock().unwrap().iter().cloned().collect();
                    let resubscribed = topics.iter().all(|t| conn.subscribe(t).is_ok());
                    if !resubscribed {
                        warn!("connection died during resubscribe, retrying");
                    } else {
                        *self.conn.lock().unwrap() = Some(conn);
                        failures = 0;
                        backoff.reset();
                        self.set_state(ConnectionState::Connected);
                        info!("connected to {} ({} topic(s))", self.url, topics.len());

                        loop {
                            tokio::select! {
                                _ = shutdown.changed() => break,
                                maybe = deliveries.recv() => match maybe {
                                    Some(delivery) => self.dispatch(delivery),
                                    None => break,
                                },
                            }
                        }

                        self.conn.lock().unwrap().take();
                        if self.is_closed() {
                            break;
                        }
                        warn!("connection to {} lost", self.url);
                        self.set_state(ConnectionState::Disconnected);
                        self.correlator.cancel_all(CancelReason::Disconnect);
                    }
                }
                Err(e) => {
                    failures += 1;
                    warn!("connect attempt {failures} failed: {e}");
                    if let Some(max) = self.reconnect.max_retries {
                        if failures >= max {
                            error!("giving up after {failures} failed connect attempts");
                            break;
                        }
                    }
                }
            }

            let delay = backoff.next_delay();
            debug!("reconnecting in {delay:?}");
            tokio::select! {
                _ = shutdown.changed() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        self.conn.lock().unwrap().take();
        self.correlator.cancel_all(CancelReason::Shutdown);
        self.set_state(ConnectionState::Closed);
        debug!("supervisor exited");
    }

    /// Route one inbound delivery to its pending request, if any.
    fn dispatch(&self, delivery: Delivery) {
        let payload: serde_json::Value = match serde_json::from_str(&delivery.payload) {
            Ok(value) => value,
            Err(e) => {
                debug!("ignoring unparseable payload on {}: {e}", delivery.topic);
                return;
            }
        };
        let Some(token) = self.scheme.extract(&payload) else {
            debug!(
                "delivery on {} carries no correlation token, ignoring",
                delivery.topic
            );
            return;
        };
        let response = Response {
            token: token.clone(),
            payload,
            received_at: chrono::Utc::now().timestamp_millis(),
        };
        match self.correlator.resolve(&token, response) {
            Resolution::Delivered => debug!("resolved request {token}"),
            // Expected under at-least-once delivery: late or duplicate.
            Resolution::NoSuchPending => debug!("dropped late or duplicate response {token}"),
        }
    }
}

impl Publisher for ConnectionManager {
    /// Publish through the live connection.
    ///
    /// Fails fast with `NotConnected` unless the manager is `Connected`,
    /// which also guarantees all recorded topics are subscribed.
    fn publish(&self, topic: &str, payload: String) -> Result<(), PublishError> {
        if self.state() != ConnectionState::Connected {
            return Err(PublishError::NotConnected);
        }
        match self.conn.lock().unwrap().as_ref() {
            Some(conn) => conn.publish(topic, payload),
            None => Err(PublishError::NotConnected),
        }
    }
}
