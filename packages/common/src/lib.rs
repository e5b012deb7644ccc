pub mod channel;
pub mod message;
pub mod notification;
pub mod render;
pub mod retry;

pub use channel::LiveChannel;
pub use message::{
    ClientMessage, EventStateChange, FirstBlood, FrameError, InstanceStatus, MessageKind,
    ScoreboardUpdate, ServerMessage, SubmissionResult,
};
pub use notification::{NotificationPayload, NotificationType, Priority};
pub use render::{Toast, ToastLevel, escape_html, strip_control};
pub use retry::{Backoff, ReconnectDecision, ReconnectPolicy, ReconnectTracker};
