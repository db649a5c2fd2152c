mod app;
mod error;
mod forms;

use anyhow::Context;
use formflow::accounts::{Accounts, ResetLink};
use formflow::{Config, ModelStore};
use std::sync::Arc;
use tokio::sync::mpsc::unbounded_channel;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::app::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::load_default()
        .context("Failed to load formflow.toml")?
        .with_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.filter)),
        )
        .init();

    info!("formflow starting...");

    let store = ModelStore::connect(&config.database.url, config.database.max_connections)
        .await
        .with_context(|| format!("Failed to connect to {}", config.database.url))?;
    info!(db = ?store.db_type(), "database connected");

    let registry = forms::build_registry().context("Invalid form or model declaration")?;
    let accounts = Accounts::new(store.clone(), &config.accounts).context("Invalid account models")?;

    // Delivering reset links (email) is not this server's job; log that one is ready
    let (reset_links, mut outbox) = unbounded_channel::<ResetLink>();
    tokio::spawn(async move {
        while let Some(link) = outbox.recv().await {
            info!(uid = %link.uidb64, expires_at = link.expires_at, "password reset link ready for delivery");
        }
    });

    let state = AppState {
        registry: Arc::new(registry),
        store,
        accounts: Arc::new(accounts),
        reset_links,
    };
    state.migrate().await.context("Failed to create tables")?;

    let app = router(state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server running at http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
