use std::net::SocketAddr;
use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod auth;
mod config;
mod db;
mod engine;
mod metrics;
mod models;

use crate::auth::rate_limit::{rate_limit_by_header, RateLimiterState};
use crate::config::AppConfig;
use crate::db::Database;

pub struct AppState {
    pub config: AppConfig,
    pub db: Database,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ztdx_core=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();
    let config = AppConfig::load()?;

    tracing::info!("Starting ztdx-core v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.environment);
    tracing::info!("Base currency: {}", config.base_currency_ticker);

    let db = Database::connect(&config.database_url).await?;
    tracing::info!("Database connected, migrations applied");

    let metrics_handle = metrics::init_metrics();
    tracing::info!("Metrics recorder installed");

    let state = Arc::new(AppState { config, db });
    let rate_limiter = RateLimiterState::default_api();

    let app = Router::new()
        .route("/health", get(health_check))
        .route(
            "/metrics",
            get({
                let handle = metrics_handle.clone();
                move || async move { handle.render() }
            }),
        )
        .nest("/api/v1", api::routes::create_router(state.clone()))
        .layer(axum::middleware::from_fn(
            api::middleware::metrics_middleware,
        ))
        .layer(axum::middleware::from_fn_with_state(
            rate_limiter,
            rate_limit_by_header,
        ))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], state.config.port));
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> &'static str {
    "OK"
}
