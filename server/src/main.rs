//! Sift Server - keeps search engine indexes in sync with host collections.
//!
//! The host posts mutation events to `/events`; the dispatcher fetches the
//! affected entries, runs them through the sift-engine pipeline and pushes
//! the result to a Meilisearch-compatible engine. Admin routes add, update
//! and remove synchronized collections and manage credentials.

mod auth;
mod config;
mod db;
mod error;
mod host;
mod routes;
mod search;
mod store;
mod sync;

use crate::config::Config;
use crate::db::PgStore;
use crate::host::{EventHub, HttpEntrySource};
use crate::search::MeiliClient;
use crate::store::{ConfigStore, KvStore, MemoryStore};
use crate::sync::SyncService;
use axum::Router;
use sift_engine::Registry;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<SyncService>,
    pub hub: Arc<EventHub>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sift_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    tracing::info!("Starting Sift Server on {}:{}", config.host, config.port);

    let kv: Arc<dyn KvStore> = match &config.database_url {
        Some(url) => {
            let pool = db::create_pool(url).await?;
            tracing::info!("Running database migrations...");
            db::run_migrations(&pool).await?;
            Arc::new(PgStore::new(pool, db::DEFAULT_NAMESPACE))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, state is kept in memory only");
            Arc::new(MemoryStore::new())
        }
    };

    let registry = match &config.collections_file {
        Some(path) => Registry::from_json(&tokio::fs::read_to_string(path).await?)?,
        None => Registry::new(),
    };
    tracing::info!(collections = registry.names().count(), "Collections loaded");

    let store = Arc::new(ConfigStore::new(kv, config.search_credentials.clone()));
    let engine = Arc::new(MeiliClient::new(store.clone(), config.search_timeout)?);
    let source = Arc::new(HttpEntrySource::new(
        config.host_api_url.clone(),
        config.host_api_token.clone(),
        config.search_timeout,
    )?);
    let hub = EventHub::new_shared(true);

    let service = Arc::new(SyncService::new(
        Arc::new(registry),
        store,
        engine,
        source,
        hub.clone(),
        config.sync_options(),
    ));

    // Subscriptions can still be restored later through /reload.
    if let Err(err) = service.start().await {
        tracing::error!(error = %err, "Could not restore subscriptions");
    }

    // Build application state
    let state = AppState {
        service,
        hub,
        config: Arc::new(config.clone()),
    };

    // Build router
    let app = Router::new()
        .merge(routes::create_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
