use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::notification::NotificationPayload;

/// Outcome of a flag submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionResult {
    pub challenge_name: String,
    pub is_correct: bool,
    #[serde(default)]
    pub points: i64,
    #[serde(default)]
    pub is_first_blood: bool,
}

/// Lifecycle change of a challenge instance (container).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceStatus {
    #[serde(deserialize_with = "string_or_number")]
    pub instance_id: String,
    pub status: String,
    pub challenge_name: String,
    #[serde(default)]
    pub message: String,
}

/// Change of the receiving team's scoreboard position.
///
/// `rank_change` is the difference `new_rank - old_rank`, so a negative value
/// means the team moved up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreboardUpdate {
    pub team_rank: u32,
    pub new_score: i64,
    #[serde(default)]
    pub rank_change: i32,
}

pub const DEFAULT_TEAM_COLOR: &str = "#ff0000";

fn default_team_color() -> String {
    DEFAULT_TEAM_COLOR.into()
}

/// First correct solve of a challenge within an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirstBlood {
    pub player_name: String,
    pub challenge_name: String,
    pub team_name: String,
    pub points: i64,
    #[serde(default = "default_team_color")]
    pub team_color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// Contest or scoreboard state transition of an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventStateChange {
    pub event_id: i64,
    pub event_name: String,
    #[serde(default)]
    pub contest_state: String,
    #[serde(default)]
    pub scoreboard_state: String,
    #[serde(default)]
    pub action: String,
}

/// Every frame the relay pushes to clients, discriminated by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Notification { notification: NotificationPayload },
    NotificationCreated { notification: NotificationPayload },
    UnreadCount { unread_count: u64 },
    EventStateChange(EventStateChange),
    SubmissionResult(SubmissionResult),
    InstanceStatus(InstanceStatus),
    ScoreboardUpdate(ScoreboardUpdate),
    FirstBlood(FirstBlood),
    Pong,
}

/// Tag of a [`ServerMessage`] without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MessageKind {
    Notification,
    NotificationCreated,
    UnreadCount,
    EventStateChange,
    SubmissionResult,
    InstanceStatus,
    ScoreboardUpdate,
    FirstBlood,
    Pong,
}

impl MessageKind {
    pub const ALL: [MessageKind; 9] = [
        MessageKind::Notification,
        MessageKind::NotificationCreated,
        MessageKind::UnreadCount,
        MessageKind::EventStateChange,
        MessageKind::SubmissionResult,
        MessageKind::InstanceStatus,
        MessageKind::ScoreboardUpdate,
        MessageKind::FirstBlood,
        MessageKind::Pong,
    ];

    /// Wire value of the `type` field.
    pub fn as_str(self) -> &'static str {
        match self {
            MessageKind::Notification => "notification",
            MessageKind::NotificationCreated => "notification_created",
            MessageKind::UnreadCount => "unread_count",
            MessageKind::EventStateChange => "event_state_change",
            MessageKind::SubmissionResult => "submission_result",
            MessageKind::InstanceStatus => "instance_status",
            MessageKind::ScoreboardUpdate => "scoreboard_update",
            MessageKind::FirstBlood => "first_blood",
            MessageKind::Pong => "pong",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        MessageKind::ALL.into_iter().find(|kind| kind.as_str() == tag)
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an inbound frame could not be turned into a [`ServerMessage`].
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("frame is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("frame has no string `type` field")]
    MissingType,

    #[error("unknown message type `{0}`")]
    UnknownType(String),

    #[error("malformed `{kind}` payload: {source}")]
    InvalidPayload {
        kind: MessageKind,
        #[source]
        source: serde_json::Error,
    },
}

impl ServerMessage {
    pub fn kind(&self) -> MessageKind {
        match self {
            ServerMessage::Notification { .. } => MessageKind::Notification,
            ServerMessage::NotificationCreated { .. } => MessageKind::NotificationCreated,
            ServerMessage::UnreadCount { .. } => MessageKind::UnreadCount,
            ServerMessage::EventStateChange(_) => MessageKind::EventStateChange,
            ServerMessage::SubmissionResult(_) => MessageKind::SubmissionResult,
            ServerMessage::InstanceStatus(_) => MessageKind::InstanceStatus,
            ServerMessage::ScoreboardUpdate(_) => MessageKind::ScoreboardUpdate,
            ServerMessage::FirstBlood(_) => MessageKind::FirstBlood,
            ServerMessage::Pong => MessageKind::Pong,
        }
    }

    /// Decode one text frame.
    ///
    /// The tag is checked before the payload so that an unrecognised `type`
    /// is reported as [`FrameError::UnknownType`] rather than as malformed.
    pub fn decode(text: &str) -> Result<Self, FrameError> {
        let value: Value = serde_json::from_str(text).map_err(FrameError::InvalidJson)?;

        let kind = {
            let tag = value
                .get("type")
                .and_then(Value::as_str)
                .ok_or(FrameError::MissingType)?;
            MessageKind::from_tag(tag).ok_or_else(|| FrameError::UnknownType(tag.to_owned()))?
        };

        serde_json::from_value(value).map_err(|source| FrameError::InvalidPayload { kind, source })
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Frames clients may send to the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Ping,
    /// Join the first-blood group of a single event.
    Subscribe { event_id: i64 },
}

impl ClientMessage {
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// Instance ids are integers on some deployments and UUID strings on others.
fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}
