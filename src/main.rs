//! Demo binary: connect to the broker, perform one identification
//! request/response exchange, print the response, and shut down.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tracing::{error, info};

use reqsub::config::load_config;
use reqsub::correlator::Correlator;
use reqsub::lifecycle::{ConnectionManager, ConnectionState};
use reqsub::session::{JsonField, Session, TokenScheme};
use reqsub::utils::logging;

#[tokio::main]
async fn main() {
    logging::init("info");

    let settings = load_config().expect("Failed to load configuration");
    let scheme: Arc<dyn TokenScheme> =
        Arc::new(JsonField::new(&settings.client.correlation_field));
    let correlator = Correlator::new();
    let manager = ConnectionManager::new(
        settings.broker_url(),
        settings.reconnect.clone(),
        correlator.clone(),
        scheme.clone(),
    );

    // Record the response topic before connecting so it is subscribed
    // before the manager ever reports Connected.
    if let Err(e) = manager.subscribe(&settings.client.subscribe_topic) {
        error!("failed to record subscription: {e}");
        return;
    }
    let supervisor = manager.start();

    if manager.wait_connected().await == ConnectionState::Closed {
        error!("could not reach broker at {}", settings.broker_url());
        return;
    }

    let session = Session::new(
        manager.clone(),
        correlator,
        scheme,
        Duration::from_secs(settings.client.request_timeout_secs),
    );

    let payload = json!({ "client_id": settings.client.client_id });
    tokio::select! {
        result = session.call(&settings.client.publish_topic, payload, None) => match result {
            Ok(response) => info!("response received: {}", response.payload),
            Err(e) => error!("request failed: {e}"),
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received. Exiting gracefully.");
        }
    }

    manager.shutdown();
    let _ = supervisor.await;
}
