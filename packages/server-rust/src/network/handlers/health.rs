//! Health, liveness, and readiness endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::json;

use super::AppState;
use crate::network::lifecycle::LifecycleState;

/// Detailed health JSON. Always 200; the body carries the actual state.
pub async fn health_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let leadership = state.meta.leadership();
    Json(json!({
        "state": state.lifecycle.state().as_str(),
        "is_primary": leadership.is_leader,
        "primary_meta_server": leadership.leader_address,
        "in_flight": state.lifecycle.in_flight_count(),
        "uptime_secs": state.start_time.elapsed().as_secs(),
    }))
}

/// Liveness: the process answers.
pub async fn liveness_handler() -> StatusCode {
    StatusCode::OK
}

/// Readiness: serving, and some primary is known so admin requests can be
/// answered or redirected.
pub async fn readiness_handler(State(state): State<AppState>) -> StatusCode {
    let leadership = state.meta.leadership();
    let leader_known = leadership.is_leader
        || leadership
            .leader_address
            .is_some_and(|address| !address.is_empty());
    if state.lifecycle.state() == LifecycleState::Serving && leader_known {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
