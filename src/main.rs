// src/main.rs
mod routes;
mod handlers;
mod models;
mod database;
mod middleware;
mod state;
mod dtos;
mod error;
mod auth;
mod config;
mod store;
mod cascade;
mod validation;
mod entry;
mod workflow;
mod session;

use std::net::{IpAddr, SocketAddr};
use std::path::Path;

use axum::{routing::get, Router};
use dotenvy::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::config::{Config, StoreBackend};
use crate::models::commission::NaturalKey;
use crate::store::{CommissionStore, MemoryCommissionStore, PgCommissionStore};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return;
        }
    };

    match config.store {
        StoreBackend::Postgres => {
            let Some(database_url) = config.database_url.as_deref() else {
                tracing::error!("DATABASE_URL must be set");
                return;
            };
            let db_pool = match database::create_pool(database_url, config.max_connections).await {
                Ok(pool) => pool,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to create database pool");
                    return;
                }
            };
            if let Err(e) = database::run_migrations(&db_pool).await {
                tracing::error!(error = %e, "Failed to run migrations");
                return;
            }
            serve(&config, PgCommissionStore::new(db_pool)).await;
        }
        StoreBackend::Memory => {
            let mappings = match config.mappings_file.as_deref() {
                Some(path) => match load_mappings(path) {
                    Ok(keys) => keys,
                    Err(e) => {
                        tracing::error!(error = %e, path = %path.display(), "Failed to load mappings");
                        return;
                    }
                },
                None => Vec::new(),
            };
            tracing::warn!(mappings = mappings.len(), "Using in-memory commission store");
            serve(&config, MemoryCommissionStore::with_mappings(mappings)).await;
        }
    }
}

fn load_mappings(path: &Path) -> Result<Vec<NaturalKey>, Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

async fn serve<S: CommissionStore>(config: &Config, store: S) {
    // Create application state
    let app_state = state::AppState::new(store, &config.jwt_secret);

    // Build application under /commission-desk base path
    let api = routes::create_router(app_state)
        .route("/", get(|| async { "Commission Desk API" }))
        .route("/health", get(health_check));

    let app = Router::new()
        .nest("/commission-desk", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let Some((listener, addr)) = bind_listener(config.host, config.port).await else {
        tracing::error!("Failed to bind to any port starting at {} on {}", config.port, config.host);
        return;
    };
    tracing::info!("Server running on {}", addr);

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "Server error");
    }
}

// Try base_port..base_port+20 to avoid crash when address is in use
async fn bind_listener(host: IpAddr, base_port: u16) -> Option<(TcpListener, SocketAddr)> {
    for offset in 0u16..=20 {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::from((host, port));
        match TcpListener::bind(addr).await {
            Ok(l) => return Some((l, addr)),
            Err(e) => {
                if offset == 0 {
                    tracing::warn!(%addr, error = %e, "Port in use, trying next");
                }
            }
        }
    }
    None
}

async fn health_check() -> &'static str {
    "OK"
}
