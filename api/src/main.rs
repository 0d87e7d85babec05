//! GridMarket API Server
//!
//! A small storefront for digital goods: users hold a credit balance, buy
//! items with gated content, top up via admin-approved transactions or
//! one-time redeem codes, and file support tickets.
//! Uses hexagonal (ports & adapters) architecture for clean separation of concerns.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, patch, post},
    Json, Router,
};
use sea_orm::Database;
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod adapters;
mod app;
mod auth;
mod config;
mod domain;
mod entity;
mod error;
mod handlers;

#[cfg(test)]
mod test_utils;

#[cfg(test)]
mod integration_tests;

use adapters::{MemoryStorage, PostgresStorage};
use app::{AccountService, BillingService, CatalogService, SupportService, UserLocks};
use config::Config;
use domain::entities::{Delivery, NewItem};
use domain::ports::Storage;
use error::DomainError;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub account_service: Arc<AccountService>,
    pub catalog_service: Arc<CatalogService>,
    pub billing_service: Arc<BillingService>,
    pub support_service: Arc<SupportService>,
}

impl AppState {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        let locks = Arc::new(UserLocks::new());

        Self {
            account_service: Arc::new(AccountService::new(storage.clone())),
            catalog_service: Arc::new(CatalogService::new(storage.clone(), locks.clone())),
            billing_service: Arc::new(BillingService::new(storage.clone(), locks)),
            support_service: Arc::new(SupportService::new(storage)),
        }
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Build the full router for the given state
pub fn routes(state: AppState) -> Router {
    // Public endpoints
    let public = Router::new()
        .route("/health", get(health))
        .route("/api/auth/register", post(handlers::register))
        .route("/api/items", get(handlers::list_items));

    // The single-item read resolves the caller if a key is sent, but also
    // serves anonymous requests (free items are visible to anyone).
    let gated_read = Router::new()
        .route("/api/items/:id", get(handlers::get_item))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::optional_auth_middleware,
        ));

    // Everything else requires a valid API key
    let protected = Router::new()
        .route("/api/auth/me", get(handlers::me))
        .route("/api/items", post(handlers::create_item))
        .route("/api/items/:id", delete(handlers::delete_item))
        .route("/api/items/:id/purchase", post(handlers::purchase_item))
        .route(
            "/api/transactions",
            get(handlers::list_transactions).post(handlers::create_transaction),
        )
        .route("/api/transactions/:id", patch(handlers::update_transaction))
        .route(
            "/api/transactions/:id/approve",
            post(handlers::approve_transaction),
        )
        .route(
            "/api/transactions/:id/reject",
            post(handlers::reject_transaction),
        )
        .route(
            "/api/tickets",
            get(handlers::list_tickets).post(handlers::create_ticket),
        )
        .route("/api/tickets/:id/reply", post(handlers::reply_to_ticket))
        .route("/api/codes", post(handlers::generate_codes))
        .route("/api/codes/redeem", post(handlers::redeem_code))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ));

    Router::new()
        .merge(public)
        .merge(gated_read)
        .merge(protected)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Pick the storage backend: Postgres when DATABASE_URL is set and
/// reachable, the in-memory store otherwise.
async fn select_storage(config: &Config) -> Arc<dyn Storage> {
    match &config.database_url {
        Some(url) => match Database::connect(url).await {
            Ok(db) => {
                tracing::info!("Database connected");
                Arc::new(PostgresStorage::new(db))
            }
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    "Database unreachable; falling back to in-memory storage"
                );
                Arc::new(MemoryStorage::new())
            }
        },
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory storage (nothing is persisted)");
            Arc::new(MemoryStorage::new())
        }
    }
}

/// Seed a couple of demo items into an empty catalog
async fn seed_catalog(storage: &dyn Storage) -> Result<(), DomainError> {
    if !storage.get_items().await?.is_empty() {
        return Ok(());
    }

    storage
        .create_item(&NewItem {
            title: "Neon Sword".to_string(),
            description: "A glowing plasma blade for your avatar.".to_string(),
            price: 500,
            delivery: Delivery::Full {
                content: "You have unlocked the Neon Sword asset pack!".to_string(),
            },
        })
        .await?;

    storage
        .create_item(&NewItem {
            title: "Hacker Manifesto".to_string(),
            description: "Serialized in three chapters, one per purchase.".to_string(),
            price: 1000,
            delivery: Delivery::Sequential {
                contents: vec![
                    "Chapter 1: Another one got caught today.".to_string(),
                    "Chapter 2: This is our world now.".to_string(),
                    "Chapter 3: We exist without skin color.".to_string(),
                ],
            },
        })
        .await?;

    tracing::info!("Seeded demo catalog");
    Ok(())
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,gridmarket_api=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting GridMarket API...");

    let config = Config::from_env();
    let storage = select_storage(&config).await;

    if let Err(err) = seed_catalog(storage.as_ref()).await {
        tracing::error!(error = %err, "Failed to seed catalog");
    }

    let state = AppState::new(storage);
    let app = routes(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listen address");
    axum::serve(listener, app).await.expect("Server error");
}
