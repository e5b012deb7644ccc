use std::fmt;

use serde::{Deserialize, Serialize};

/// A purpose-specific WebSocket channel served by the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LiveChannel {
    /// Per-user, per-team and system-wide notifications. Requires a token.
    Notifications,
    /// Anonymous first-blood announcements.
    FirstBlood,
}

impl LiveChannel {
    pub const ALL: [LiveChannel; 2] = [LiveChannel::Notifications, LiveChannel::FirstBlood];

    /// Request path of the channel, including the trailing slash the routes expect.
    pub fn path(self) -> &'static str {
        match self {
            LiveChannel::Notifications => "/ws/notifications/",
            LiveChannel::FirstBlood => "/ws/first-blood/",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LiveChannel::Notifications => "notifications",
            LiveChannel::FirstBlood => "first-blood",
        }
    }
}

impl fmt::Display for LiveChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
