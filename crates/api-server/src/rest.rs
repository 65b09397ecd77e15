//! Operational endpoints: health, readiness and liveness.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use reseller_management::ResellerStore;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// Shared state for the operational handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ResellerStore>,
    pub node_id: String,
    pub start_time: Instant,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub node_id: String,
    pub uptime_secs: u64,
    pub owners: usize,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        node_id: state.node_id.clone(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        owners: state.store.owners().len(),
    })
}

/// GET /ready. The store is built (and any snapshot
/// loaded) before the listener binds, so a reachable server is ready.
pub async fn readiness() -> StatusCode {
    StatusCode::OK
}

/// GET /live
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}
