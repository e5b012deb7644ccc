use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Category of a platform notification.
///
/// Unrecognised categories deserialize to [`NotificationType::Other`] so a
/// newer server never breaks an older client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NotificationType {
    #[default]
    System,
    Event,
    Challenge,
    ChallengeRelease,
    Submission,
    Violation,
    Team,
    Admin,
    UserBanned,
    Hint,
    Other,
}

impl NotificationType {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationType::System => "system",
            NotificationType::Event => "event",
            NotificationType::Challenge => "challenge",
            NotificationType::ChallengeRelease => "challenge_release",
            NotificationType::Submission => "submission",
            NotificationType::Violation => "violation",
            NotificationType::Team => "team",
            NotificationType::Admin => "admin",
            NotificationType::UserBanned => "user_banned",
            NotificationType::Hint => "hint",
            NotificationType::Other => "other",
        }
    }

    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "system" => NotificationType::System,
            "event" => NotificationType::Event,
            "challenge" => NotificationType::Challenge,
            "challenge_release" => NotificationType::ChallengeRelease,
            "submission" => NotificationType::Submission,
            "violation" => NotificationType::Violation,
            "team" => NotificationType::Team,
            "admin" => NotificationType::Admin,
            "user_banned" => NotificationType::UserBanned,
            "hint" => NotificationType::Hint,
            _ => NotificationType::Other,
        }
    }
}

impl Serialize for NotificationType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for NotificationType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(NotificationType::from_tag(&tag))
    }
}

/// Notification urgency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

/// Body of `notification` and `notification_created` frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub title: String,
    pub message: String,
    #[serde(default, alias = "type")]
    pub notification_type: NotificationType,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub action_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub action_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl NotificationPayload {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            message: message.into(),
            notification_type: NotificationType::default(),
            priority: Priority::default(),
            action_url: String::new(),
            action_text: String::new(),
            created_at: None,
        }
    }

    pub fn with_type(mut self, notification_type: NotificationType) -> Self {
        self.notification_type = notification_type;
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }
}
