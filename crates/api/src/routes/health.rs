//! Health check endpoints.

use axum::{extract::State, http::StatusCode, Json};
use keyed_store::health::check_connection;
use telemetry::{health, HealthStatus};

use crate::response::HealthResponse;
use crate::state::AppState;

/// GET /health - Full health check. Pings the store on every call.
pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let connected = check_connection(state.store.as_ref()).await;
    health().store.record(connected, "ping failed");

    let (status, code) = if connected {
        (HealthStatus::Healthy, StatusCode::OK)
    } else {
        (HealthStatus::Unhealthy, StatusCode::SERVICE_UNAVAILABLE)
    };

    (
        code,
        Json(HealthResponse {
            status: status.as_str().to_string(),
            redis_connected: connected,
            pending_replies: state.gateway.dispatcher().pending() as u64,
        }),
    )
}

/// GET /health/ready - Readiness probe (can accept traffic).
pub async fn ready_handler() -> StatusCode {
    if health().is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// GET /health/live - Liveness probe (service is running).
pub async fn live_handler() -> StatusCode {
    if health().is_alive() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
