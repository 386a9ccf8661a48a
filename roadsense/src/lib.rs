//! # roadsense: road-state telemetry ingestion and live fan-out
//!
//! `roadsense` is a small service that accepts processed agent data — a
//! road-state classification plus accelerometer and GPS readings tied to a
//! user — persists it in PostgreSQL, and pushes newly stored records in real
//! time to WebSocket subscribers keyed by user id.
//!
//! ## Architecture
//!
//! The service is built on [Axum](https://github.com/tokio-rs/axum) for the
//! HTTP and WebSocket layer and uses PostgreSQL (via SQLx) for persistence.
//!
//! A create request flows through three stages: the payload is validated
//! ([`api::models`]), written in its own transaction through the repository
//! ([`db::handlers`]), and the stored record is then broadcast through the
//! in-process [`subscriptions::SubscriptionRegistry`] to every live channel
//! registered for that user id. Read, list, update, and delete requests touch
//! the repository only. Delivery to subscribers is best-effort: the commit
//! always happens before the broadcast, but no acknowledgment or replay
//! exists, and a dead channel is simply dropped from the registry.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use roadsense::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = roadsense::config::Args::parse();
//!     let config = Config::load(&args)?;
//!     roadsense::telemetry::init_telemetry()?;
//!
//!     Application::new(config)
//!         .await?
//!         .serve(async {
//!             tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!         })
//!         .await
//! }
//! ```
//!
//! ## Database Setup
//!
//! The service requires a PostgreSQL database and automatically runs the
//! embedded migrations on startup; see [`migrator`].

pub mod api;
pub mod config;
pub mod db;
pub mod errors;
mod openapi;
pub mod subscriptions;
pub mod telemetry;
pub mod types;

#[cfg(test)]
pub mod test_utils;

use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderValue;
use axum::{
    Router,
    routing::{get, post},
};
use bon::Builder;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::config::CorsOrigin;
use crate::openapi::ApiDoc;
use crate::subscriptions::SubscriptionRegistry;

pub use config::Config;
pub use types::{RecordId, UserId};

/// Application state shared across all request handlers.
///
/// - `db`: PostgreSQL connection pool
/// - `config`: Application configuration loaded from file/environment
/// - `subscriptions`: In-process registry of live subscriber channels
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    pub subscriptions: Arc<SubscriptionRegistry>,
}

/// Get the roadsense database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let mut origins = Vec::new();
    for origin in &config.cors.allowed_origins {
        let header_value = match origin {
            CorsOrigin::Wildcard => "*".parse::<HeaderValue>()?,
            CorsOrigin::Url(url) => url.as_str().parse::<HeaderValue>()?,
        };
        origins.push(header_value);
    }

    let mut cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(config.cors.allow_credentials);

    if let Some(max_age) = config.cors.max_age {
        cors = cors.max_age(Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the application router with all endpoints and middleware.
///
/// Record endpoints are registered with and without the trailing slash on the
/// collection path so both client spellings resolve. The WebSocket subscribe
/// channel lives at `/ws/{user_id}`.
#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    let record_routes = post(api::handlers::processed_agent_data::create_processed_agent_data)
        .get(api::handlers::processed_agent_data::list_processed_agent_data);

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .route("/processed_agent_data", record_routes.clone())
        .route("/processed_agent_data/", record_routes)
        .route(
            "/processed_agent_data/{id}",
            get(api::handlers::processed_agent_data::read_processed_agent_data)
                .put(api::handlers::processed_agent_data::update_processed_agent_data)
                .delete(api::handlers::processed_agent_data::delete_processed_agent_data),
        )
        .route("/ws/{user_id}", get(api::handlers::ws::subscribe_handler))
        .with_state(state.clone())
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    let cors_layer = create_cors_layer(&state.config)?;

    let router = router.layer(cors_layer).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// Main application struct that owns all resources and lifecycle.
///
/// 1. **Create**: [`Application::new`] connects the pool, runs migrations,
///    and builds the router
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and handles
///    requests until the shutdown future resolves
pub struct Application {
    router: Router,
    config: Config,
    pool: PgPool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        Self::new_with_pool(config, None).await
    }

    /// Create an application around an existing pool (used by tests).
    pub async fn new_with_pool(config: Config, pool: Option<PgPool>) -> anyhow::Result<Self> {
        let pool = match pool {
            Some(pool) => pool,
            None => {
                let settings = &config.database.pool;
                PgPoolOptions::new()
                    .max_connections(settings.max_connections)
                    .min_connections(settings.min_connections)
                    .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
                    .connect(&config.database_url())
                    .await?
            }
        };

        migrator().run(&pool).await?;

        let state = AppState::builder()
            .db(pool.clone())
            .config(config.clone())
            .subscriptions(Arc::new(SubscriptionRegistry::new()))
            .build();

        let router = build_router(&state)?;

        Ok(Self { router, config, pool })
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("roadsense listening on http://{}", bind_addr);

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing database connections...");
        self.pool.close().await;

        Ok(())
    }
}
