use axum::{Json, extract::State};
use tracing::{info, instrument};

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::Publisher;
use crate::extractors::json::AppJson;
use crate::models::broadcast::{BroadcastRequest, BroadcastResponse, validate_broadcast_request};
use crate::state::AppState;

/// Publish a message to every live connection in the target groups.
#[utoipa::path(
    post,
    path = "/api/v1/broadcast",
    tag = "Broadcast",
    operation_id = "broadcast",
    summary = "Push a message to live connections",
    description = "Queues the message for every connection in the union of the target groups. A connection in several targeted groups receives it once. Requires `X-Publish-Key` when a publish key is configured.",
    request_body = BroadcastRequest,
    responses(
        (status = 200, description = "Message queued", body = BroadcastResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Missing publish key (TOKEN_MISSING)", body = ErrorBody),
        (status = 403, description = "Wrong publish key (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("publish_key" = [])),
)]
#[instrument(skip(state, _publisher, payload), fields(kind = %payload.message.kind()))]
pub async fn broadcast(
    State(state): State<AppState>,
    _publisher: Publisher,
    AppJson(payload): AppJson<BroadcastRequest>,
) -> Result<Json<BroadcastResponse>, AppError> {
    validate_broadcast_request(&payload)?;

    let delivered = state.hub.publish(&payload.targets, &payload.message)?;
    let groups: Vec<String> = payload.targets.iter().map(ToString::to_string).collect();

    info!(delivered, groups = ?groups, "Broadcast queued");

    Ok(Json(BroadcastResponse { delivered, groups }))
}
