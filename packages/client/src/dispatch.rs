//! Routing of decoded frames to a [`LiveHandler`].

use async_trait::async_trait;
use common::{
    EventStateChange, FirstBlood, FrameError, InstanceStatus, LiveChannel, MessageKind,
    NotificationPayload, ScoreboardUpdate, ServerMessage, SubmissionResult,
};
use tracing::{debug, warn};

use crate::error::ClientError;

/// Receives live messages and connection lifecycle notices.
///
/// There is one method per [`MessageKind`]. Lifecycle methods and
/// [`on_pong`](LiveHandler::on_pong) have no-op defaults.
#[async_trait]
pub trait LiveHandler: Send + Sync {
    async fn on_notification(&self, notification: NotificationPayload);
    async fn on_notification_created(&self, notification: NotificationPayload);
    async fn on_unread_count(&self, unread_count: u64);
    async fn on_event_state_change(&self, change: EventStateChange);
    async fn on_submission_result(&self, result: SubmissionResult);
    async fn on_instance_status(&self, status: InstanceStatus);
    async fn on_scoreboard_update(&self, update: ScoreboardUpdate);
    async fn on_first_blood(&self, first_blood: FirstBlood);

    async fn on_pong(&self) {}

    /// The socket for `channel` opened.
    async fn on_connected(&self, channel: LiveChannel) {
        let _ = channel;
    }

    /// The socket for `channel` failed. Reconnecting is left to the close path.
    async fn on_connection_error(&self, channel: LiveChannel, error: &ClientError) {
        let _ = (channel, error);
    }

    /// The reconnect budget for `channel` is spent; no further attempts follow.
    async fn on_gave_up(&self, channel: LiveChannel, attempts: u32) {
        let _ = (channel, attempts);
    }
}

/// Hand a message to the one handler method for its kind.
pub async fn dispatch(handler: &dyn LiveHandler, message: ServerMessage) {
    match message {
        ServerMessage::Notification { notification } => handler.on_notification(notification).await,
        ServerMessage::NotificationCreated { notification } => {
            handler.on_notification_created(notification).await
        }
        ServerMessage::UnreadCount { unread_count } => handler.on_unread_count(unread_count).await,
        ServerMessage::EventStateChange(change) => handler.on_event_state_change(change).await,
        ServerMessage::SubmissionResult(result) => handler.on_submission_result(result).await,
        ServerMessage::InstanceStatus(status) => handler.on_instance_status(status).await,
        ServerMessage::ScoreboardUpdate(update) => handler.on_scoreboard_update(update).await,
        ServerMessage::FirstBlood(first_blood) => handler.on_first_blood(first_blood).await,
        ServerMessage::Pong => handler.on_pong().await,
    }
}

/// What became of one inbound text frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    Dispatched(MessageKind),
    Malformed,
    UnknownType(String),
}

/// Decode a text frame and dispatch it. Bad frames are logged and dropped.
pub async fn handle_frame(
    handler: &dyn LiveHandler,
    channel: LiveChannel,
    text: &str,
) -> FrameOutcome {
    match ServerMessage::decode(text) {
        Ok(message) => {
            let kind = message.kind();
            debug!(%channel, %kind, "Dispatching frame");
            dispatch(handler, message).await;
            FrameOutcome::Dispatched(kind)
        }
        Err(FrameError::UnknownType(tag)) => {
            warn!(%channel, tag = %tag, "Dropping frame with unknown type");
            FrameOutcome::UnknownType(tag)
        }
        Err(e) => {
            warn!(%channel, error = %e, "Dropping malformed frame");
            FrameOutcome::Malformed
        }
    }
}
