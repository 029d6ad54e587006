use std::sync::Arc;

use anyhow::{Context, Result};
use cart_items::config::ITEMS_COLLECTION;
use cart_items::{http, Config, Database, ItemHandler};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env().context("load configuration")?;
    let database = Database::connect(&config.store_url).context("connect to item store")?;
    let items = database.collection(ITEMS_COLLECTION);
    tracing::info!(database = database.name(), collection = ITEMS_COLLECTION, "store connected");

    let handler = Arc::new(ItemHandler::new(items).with_schema(config.schema.clone()));
    http::serve_with_shutdown(handler, config.pool_size, &config.bind_addr(), shutdown_signal())
        .await
        .with_context(|| format!("serve on {}", config.bind_addr()))?;

    tracing::info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
