//! The weft execution worker.
//!
//! Connects to Postgres and NATS, then consumes the execution queue until
//! interrupted. Multiple worker processes can run side by side; the shared
//! durable consumer hands each queued execution to exactly one of them.

mod config;
mod db;
mod memory;

use config::WorkerConfig;
use db::PgEngineStore;
use memory::NatsKvMemory;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use weft_ai::gemini::GeminiProvider;
use weft_nodes::PlatformNodeRunner;
use weft_workflow::consumer::QueueConsumer;
use weft_workflow::coordinator::ExecutionCoordinator;
use weft_workflow::nats::{NatsConfig, NatsEventPublisher, NatsExecutionQueue};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = WorkerConfig::from_env().expect("failed to load configuration");
    tracing::info!("Loaded configuration");

    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    let nats_config = NatsConfig::new(config.nats.url.clone());
    let queue = NatsExecutionQueue::connect(&nats_config)
        .await
        .expect("failed to connect to execution queue");

    let nats_client = async_nats::connect(&config.nats.url)
        .await
        .expect("failed to connect to NATS");
    let jetstream = async_nats::jetstream::new(nats_client.clone());

    let publisher = Arc::new(NatsEventPublisher::from_client(nats_client));
    let conversation_memory = Arc::new(
        NatsKvMemory::connect(&jetstream)
            .await
            .expect("failed to open memory bucket"),
    );

    let store = Arc::new(PgEngineStore::new(db_pool));
    let runner = Arc::new(PlatformNodeRunner::new(
        store.clone(),
        conversation_memory,
        Arc::new(GeminiProvider::new()),
    ));

    let coordinator = ExecutionCoordinator::new(store, publisher, runner);
    let consumer = QueueConsumer::new(queue, coordinator);

    tokio::select! {
        () = consumer.run() => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received, stopping worker");
        }
    }
}
