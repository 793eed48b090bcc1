mod settings;

use crate::config::settings::PartialSettings;
use config::{Config, ConfigError, Environment, File};

pub use settings::{BrokerSettings, ClientSettings, ReconnectSettings, Settings};

/// Loads the configuration from the default file and environment variables
/// Merges the configuration with default values
/// Returns a `Settings` struct with every field filled in
pub fn load_config() -> Result<Settings, ConfigError> {
    let builder = Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(Environment::default().separator("_"));

    let config = builder.build()?;

    // Try to deserialize what is available
    let partial: PartialSettings = config.try_deserialize()?;

    // Merge with defaults
    let default = Settings::default();

    Ok(Settings {
        broker: BrokerSettings {
            host: partial
                .broker
                .as_ref()
                .and_then(|b| b.host.clone())
                .unwrap_or(default.broker.host),
            port: partial
                .broker
                .as_ref()
                .and_then(|b| b.port)
                .unwrap_or(default.broker.port),
        },
        client: ClientSettings {
            client_id: partial
                .client
                .as_ref()
                .and_then(|c| c.client_id.clone())
                .unwrap_or(default.client.client_id),
            publish_topic: partial
                .client
                .as_ref()
                .and_then(|c| c.publish_topic.clone())
                .unwrap_or(default.client.publish_topic),
            subscribe_topic: partial
                .client
                .as_ref()
                .and_then(|c| c.subscribe_topic.clone())
                .unwrap_or(default.client.subscribe_topic),
            request_timeout_secs: partial
                .client
                .as_ref()
                .and_then(|c| c.request_timeout_secs)
                .unwrap_or(default.client.request_timeout_secs),
            correlation_field: partial
                .client
                .as_ref()
                .and_then(|c| c.correlation_field.clone())
                .unwrap_or(default.client.correlation_field),
        },
        reconnect: ReconnectSettings {
            initial_delay_ms: partial
                .reconnect
                .as_ref()
                .and_then(|r| r.initial_delay_ms)
                .unwrap_or(default.reconnect.initial_delay_ms),
            max_delay_ms: partial
                .reconnect
                .as_ref()
                .and_then(|r| r.max_delay_ms)
                .unwrap_or(default.reconnect.max_delay_ms),
            max_retries: partial
                .reconnect
                .as_ref()
                .and_then(|r| r.max_retries)
                .or(default.reconnect.max_retries),
        },
    })
}
