//! The weft event relay.
//!
//! A WebSocket server that bridges browser observers onto the engine's
//! pub/sub event channels. Events are transient: an observer only sees
//! what is published while it is connected and subscribed.

mod config;
mod relay;

use axum::routing::get;
use axum::Router;
use config::RelayConfig;
use relay::{ws_handler, RelayState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = RelayConfig::from_env().expect("failed to load configuration");

    let client = async_nats::connect(&config.nats.url)
        .await
        .expect("failed to connect to NATS");

    let app = Router::new()
        .route("/ws", get(ws_handler))
        .with_state(RelayState { client });

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .expect("failed to bind to address");

    tracing::info!("relay listening on ws://{}/ws", config.listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received, stopping relay");
        })
        .await
        .expect("server error");
}
