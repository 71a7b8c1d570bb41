use std::sync::Arc;

use checkout_fulfillment::api;
use checkout_fulfillment::config::Config;
use checkout_fulfillment::error::AppError;
use checkout_fulfillment::geo::routing::{HttpRoutingClient, RoutingClient};
use checkout_fulfillment::pricing::PricingTable;
use checkout_fulfillment::state::AppState;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false)
        .compact()
        .init();

    let pricing = Arc::new(PricingTable::load(config.pricing_table_path.as_deref())?);
    tracing::info!(
        vehicles = pricing.vehicles.len(),
        zones = pricing.zones.len() + 1,
        store = %pricing.store.name,
        "pricing table loaded"
    );

    let routing: Option<Arc<dyn RoutingClient>> = match &config.routing_url {
        Some(url) => {
            let client: Arc<dyn RoutingClient> = Arc::new(
                HttpRoutingClient::new(url.clone(), config.routing_timeout())
                    .map_err(|err| AppError::Internal(format!("routing client: {err}")))?,
            );
            tracing::info!(routing_url = %url, timeout_ms = config.routing_timeout_ms, "routing enabled");
            Some(client)
        }
        None => {
            tracing::warn!("ROUTING_URL not set; distances use haversine and zone estimates");
            None
        }
    };

    let shared_state = Arc::new(AppState::new(
        pricing,
        routing,
        config.routing_timeout(),
        config.event_buffer_size,
    ));

    let app = api::rest::router(shared_state);

    let bind_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| AppError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(http_port = config.http_port, "http server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::Internal(format!("server error: {err}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
