use common::ServerMessage;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::hub::Group;

/// Request body for publishing a message to live connections.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct BroadcastRequest {
    /// Groups to deliver to. Each entry is `{"kind": "user" | "team" |
    /// "first_blood_event", "id": N}` or `{"kind": "system" | "first_blood"}`.
    #[schema(value_type = Vec<Object>, example = json!([{"kind": "team", "id": 12}]))]
    pub targets: Vec<Group>,
    /// The frame to push, tagged by `type`.
    #[schema(value_type = Object, example = json!({
        "type": "scoreboard_update",
        "team_rank": 3,
        "new_score": 450,
        "rank_change": -2
    }))]
    pub message: ServerMessage,
}

pub fn validate_broadcast_request(payload: &BroadcastRequest) -> Result<(), AppError> {
    if payload.targets.is_empty() {
        return Err(AppError::Validation(
            "At least one target is required".into(),
        ));
    }
    if payload.targets.len() > 64 {
        return Err(AppError::Validation(
            "At most 64 targets per broadcast".into(),
        ));
    }
    if matches!(payload.message, ServerMessage::Pong) {
        return Err(AppError::Validation(
            "`pong` is a keepalive reply and cannot be broadcast".into(),
        ));
    }
    Ok(())
}

/// Successful broadcast response.
#[derive(Serialize, utoipa::ToSchema)]
pub struct BroadcastResponse {
    /// Number of connections the message was queued for.
    #[schema(example = 17)]
    pub delivered: usize,
    /// Resolved group names.
    #[schema(example = json!(["team_12"]))]
    pub groups: Vec<String>,
}
