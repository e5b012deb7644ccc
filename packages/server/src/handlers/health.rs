use axum::{Json, extract::State};

use crate::models::health::HealthResponse;
use crate::state::AppState;

/// Liveness probe with hub occupancy.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    operation_id = "health",
    responses((status = 200, description = "Service is up", body = HealthResponse)),
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "dojo-relay",
        connections: state.hub.connection_count(),
        groups: state.hub.group_count(),
    })
}
