//! API route handlers for the gateway.

use axum::body::Bytes;
use axum::http::StatusCode;
use axum::{Json, extract::State};
use std::sync::Arc;
use subclock_scheduler::Outcome;

use super::server::AppState;
use super::validation::{
    ApiError, DeregisterRequest, SubscriptionRequest, parse_body, validate_deregister,
    validate_subscription,
};

type Accepted = (StatusCode, Json<serde_json::Value>);

fn accepted(outcome: Outcome, address: &str) -> Accepted {
    (
        StatusCode::ACCEPTED,
        Json(serde_json::json!({
            "ok": true,
            "outcome": outcome,
            "callbackURL": address,
        })),
    )
}

/// Health check endpoint.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "subclock-gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": state.start_time.elapsed().as_secs(),
        "subscriptions": state.scheduler.subscription_count(),
    }))
}

/// Subscribe a callback URL.
pub async fn register(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Accepted, ApiError> {
    tracing::info!("📥 Register request: {}", String::from_utf8_lossy(&body));
    let req: SubscriptionRequest = parse_body(&body)?;
    let config = validate_subscription(&req, &state.limits)?;
    let address = config.callback_address().to_string();

    match state.scheduler.register(config) {
        Outcome::Conflict => Err(ApiError::Conflict(address)),
        outcome => Ok(accepted(outcome, &address)),
    }
}

/// Change the frequency of an existing subscription.
pub async fn update(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Accepted, ApiError> {
    tracing::info!("📥 Update request: {}", String::from_utf8_lossy(&body));
    let req: SubscriptionRequest = parse_body(&body)?;
    let config = validate_subscription(&req, &state.limits)?;
    let address = config.callback_address().to_string();

    match state.scheduler.update(config) {
        Outcome::NotFound => Err(ApiError::NotFound(address)),
        Outcome::Conflict => Err(ApiError::Conflict(address)),
        outcome => Ok(accepted(outcome, &address)),
    }
}

/// Stop calling a callback URL.
pub async fn deregister(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Accepted, ApiError> {
    tracing::info!("📥 Deregister request: {}", String::from_utf8_lossy(&body));
    let req: DeregisterRequest = parse_body(&body)?;
    let address = validate_deregister(&req)?;

    match state.scheduler.unregister(&address) {
        Outcome::NotFound => Err(ApiError::NotFound(address)),
        outcome => Ok(accepted(outcome, &address)),
    }
}

/// List live subscriptions.
pub async fn list_subscriptions(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let subscriptions = state.scheduler.list();
    Json(serde_json::json!({
        "count": subscriptions.len(),
        "subscriptions": subscriptions,
    }))
}
