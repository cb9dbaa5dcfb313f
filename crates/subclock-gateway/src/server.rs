//! HTTP server implementation using Axum.

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use subclock_core::{LimitsConfig, SubClockConfig};
use subclock_scheduler::{HttpNotifier, Scheduler};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared state for the gateway server.
pub struct AppState {
    /// Owns every live subscription.
    pub scheduler: Arc<Scheduler>,
    /// Allowed frequency range for incoming requests.
    pub limits: LimitsConfig,
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(scheduler: Arc<Scheduler>, limits: LimitsConfig) -> Self {
        Self {
            scheduler,
            limits,
            start_time: std::time::Instant::now(),
        }
    }
}

/// Build the Axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    build_router_from_arc(Arc::new(state))
}

pub fn build_router_from_arc(shared: Arc<AppState>) -> Router {
    let cors = {
        let cors = CorsLayer::new()
            .allow_methods([
                axum::http::Method::GET,
                axum::http::Method::POST,
                axum::http::Method::PUT,
                axum::http::Method::OPTIONS,
            ])
            .allow_headers(Any)
            .max_age(std::time::Duration::from_secs(3600));

        // Example: SUBCLOCK_CORS_ORIGINS=https://a.example,https://b.example
        if let Ok(origins_str) = std::env::var("SUBCLOCK_CORS_ORIGINS") {
            let origins: Vec<_> = origins_str
                .split(',')
                .filter_map(|s| s.trim().parse::<axum::http::HeaderValue>().ok())
                .collect();
            cors.allow_origin(origins)
        } else {
            cors.allow_origin(Any)
        }
    };

    Router::new()
        .route("/health", get(super::routes::health_check))
        .route(
            "/v1/register",
            post(super::routes::register).put(super::routes::update),
        )
        .route("/v1/deregister", post(super::routes::deregister))
        .route("/v1/subscriptions", get(super::routes::list_subscriptions))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}

/// Start the HTTP server and run until Ctrl-C, then stop every subscription.
pub async fn start(config: &SubClockConfig) -> anyhow::Result<()> {
    let notifier = HttpNotifier::new(&config.notifier)?;
    match config.notifier.timeout() {
        Some(timeout) => tracing::info!("📮 HTTP notifier ready (timeout {:?})", timeout),
        None => tracing::info!("📮 HTTP notifier ready (no timeout)"),
    }
    let scheduler = Arc::new(Scheduler::new(Arc::new(notifier)));

    let state = AppState::new(scheduler.clone(), config.limits.clone());
    let app = build_router(state);

    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("🌐 Gateway server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.shutdown();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("❌ Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("🛑 Shutdown requested");
}
