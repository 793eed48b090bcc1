use serde::Deserialize;

/// Top-level configuration for the client.
///
/// Covers the broker endpoint, the client identity and topics, and the
/// reconnection policy.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub broker: BrokerSettings,
    pub client: ClientSettings,
    pub reconnect: ReconnectSettings,
}

/// Where the broker lives.
#[derive(Debug, Deserialize, Clone)]
pub struct BrokerSettings {
    pub host: String,
    pub port: u16,
}

/// Client identity and request/response topics.
#[derive(Debug, Deserialize, Clone)]
pub struct ClientSettings {
    pub client_id: String,
    /// Topic requests are published to.
    pub publish_topic: String,
    /// Topic responses arrive on; subscribed before any call is made.
    pub subscribe_topic: String,
    /// Default per-call timeout, overridable per call.
    pub request_timeout_secs: u64,
    /// JSON field the correlation token is embedded under.
    pub correlation_field: String,
}

/// Reconnect backoff parameters.
#[derive(Debug, Deserialize, Clone)]
pub struct ReconnectSettings {
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    /// `None` retries forever with the delay capped at `max_delay_ms`.
    pub max_retries: Option<u32>,
}

/// Partial configuration loaded from files or environment.
///
/// Allows partial specification of settings. Missing values can be filled using defaults.
#[derive(Debug, Deserialize)]
pub struct PartialSettings {
    pub broker: Option<PartialBrokerSettings>,
    pub client: Option<PartialClientSettings>,
    pub reconnect: Option<PartialReconnectSettings>,
}

#[derive(Debug, Deserialize)]
pub struct PartialBrokerSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Deserialize)]
pub struct PartialClientSettings {
    pub client_id: Option<String>,
    pub publish_topic: Option<String>,
    pub subscribe_topic: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub correlation_field: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PartialReconnectSettings {
    pub initial_delay_ms: Option<u64>,
    pub max_delay_ms: Option<u64>,
    pub max_retries: Option<u32>,
}

/// Provides default values for `Settings`.
///
/// Ensures the client works against a local broker with no configuration
/// at all.
impl Default for Settings {
    fn default() -> Self {
        Self {
            broker: BrokerSettings {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            client: ClientSettings {
                client_id: "reqsub-client".to_string(),
                publish_topic: "requests/identify".to_string(),
                subscribe_topic: "requests/respond".to_string(),
                request_timeout_secs: 5,
                correlation_field: "correlation_id".to_string(),
            },
            reconnect: ReconnectSettings {
                initial_delay_ms: 100,
                max_delay_ms: 30_000,
                max_retries: None,
            },
        }
    }
}

impl Settings {
    /// WebSocket URL of the broker.
    pub fn broker_url(&self) -> String {
        format!("ws://{}:{}", self.broker.host, self.broker.port)
    }
}
