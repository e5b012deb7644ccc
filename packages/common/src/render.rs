//! Turns dispatched messages into transient toasts.
//!
//! Every string that originates from a server payload goes through
//! [`escape_html`] before it is placed in markup.

use std::fmt::Write as _;
use std::time::Duration;

use crate::message::{
    DEFAULT_TEAM_COLOR, EventStateChange, FirstBlood, InstanceStatus, ScoreboardUpdate,
    ServerMessage, SubmissionResult,
};
use crate::notification::{NotificationPayload, NotificationType, Priority};

pub const DEFAULT_TOAST_TTL: Duration = Duration::from_secs(5);
pub const FIRST_BLOOD_TOAST_TTL: Duration = Duration::from_secs(8);
pub const FIRST_BLOOD_MARKER: &str = "First Blood!";

/// Escape text for safe interpolation into HTML element content or a
/// quoted attribute value.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Replace control characters with U+FFFD so server text cannot drive the
/// terminal it is printed to.
pub fn strip_control(input: &str) -> String {
    input
        .chars()
        .map(|c| if c.is_control() { '\u{fffd}' } else { c })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToastLevel {
    Success,
    Info,
    Warning,
    Error,
}

impl ToastLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            ToastLevel::Success => "success",
            ToastLevel::Info => "info",
            ToastLevel::Warning => "warning",
            ToastLevel::Error => "error",
        }
    }
}

/// A transient, self-expiring UI notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub level: ToastLevel,
    pub title: String,
    pub body: String,
    pub ttl: Duration,
    /// Full-width banner markup shown above the toast, for first bloods.
    pub banner: Option<String>,
}

impl Toast {
    pub fn new(level: ToastLevel, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            body: body.into(),
            ttl: DEFAULT_TOAST_TTL,
            banner: None,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_banner(mut self, banner: String) -> Self {
        self.banner = Some(banner);
        self
    }

    /// Toast for a message, or `None` for frames that carry no visible notice.
    pub fn from_message(message: &ServerMessage) -> Option<Self> {
        match message {
            ServerMessage::Notification { notification }
            | ServerMessage::NotificationCreated { notification } => {
                Some(Self::notification(notification))
            }
            ServerMessage::EventStateChange(change) => Some(Self::event_state(change)),
            ServerMessage::SubmissionResult(result) => Some(Self::submission(result)),
            ServerMessage::InstanceStatus(status) => Some(Self::instance(status)),
            ServerMessage::ScoreboardUpdate(update) => Some(Self::scoreboard(update)),
            ServerMessage::FirstBlood(first_blood) => Some(Self::first_blood(first_blood)),
            ServerMessage::UnreadCount { .. } | ServerMessage::Pong => None,
        }
    }

    pub fn notification(notification: &NotificationPayload) -> Self {
        let level = match (notification.notification_type, notification.priority) {
            (NotificationType::UserBanned | NotificationType::Violation, _) => ToastLevel::Error,
            (_, Priority::Urgent) => ToastLevel::Error,
            (_, Priority::High) => ToastLevel::Warning,
            _ => ToastLevel::Info,
        };
        Self::new(level, &notification.title, &notification.message)
    }

    pub fn submission(result: &SubmissionResult) -> Self {
        if !result.is_correct {
            return Self::new(
                ToastLevel::Error,
                "Incorrect Flag",
                format!("That flag was incorrect for {}.", result.challenge_name),
            );
        }

        let mut body = format!("Solved {}", result.challenge_name);
        if result.points > 0 {
            let _ = write!(body, ", +{} pts", result.points);
        }
        if result.is_first_blood {
            let _ = write!(body, " {FIRST_BLOOD_MARKER}");
        }
        Self::new(ToastLevel::Success, "Correct Flag!", body)
    }

    pub fn instance(status: &InstanceStatus) -> Self {
        let level = match status.status.to_ascii_lowercase().as_str() {
            "running" | "started" | "renewed" => ToastLevel::Success,
            "failed" | "error" => ToastLevel::Error,
            "stopped" | "expired" | "expiring" => ToastLevel::Warning,
            _ => ToastLevel::Info,
        };
        let body = if status.message.is_empty() {
            format!("{} is {}", status.challenge_name, status.status)
        } else {
            status.message.clone()
        };
        Self::new(level, format!("Instance {}", status.status), body)
    }

    pub fn scoreboard(update: &ScoreboardUpdate) -> Self {
        let level = if update.rank_change < 0 {
            ToastLevel::Success
        } else if update.rank_change > 0 {
            ToastLevel::Warning
        } else {
            ToastLevel::Info
        };
        Self::new(
            level,
            "Scoreboard Update",
            format!(
                "Rank #{} ({}), {} pts",
                update.team_rank,
                rank_movement(update.rank_change),
                update.new_score
            ),
        )
    }

    pub fn first_blood(first_blood: &FirstBlood) -> Self {
        Self::new(
            ToastLevel::Success,
            FIRST_BLOOD_MARKER,
            format!(
                "{} ({}) drew first blood on {}, +{} pts",
                first_blood.player_name,
                first_blood.team_name,
                first_blood.challenge_name,
                first_blood.points
            ),
        )
        .with_ttl(FIRST_BLOOD_TOAST_TTL)
        .with_banner(first_blood_html(first_blood))
    }

    pub fn event_state(change: &EventStateChange) -> Self {
        let action = if change.action.is_empty() {
            "state changed".to_string()
        } else {
            change.action.replace('_', " ")
        };
        Self::new(
            ToastLevel::Info,
            change.event_name.clone(),
            format!(
                "Event {action}: contest {}, scoreboard {}",
                change.contest_state, change.scoreboard_state
            ),
        )
    }

    /// Markup for a toast element, preceded by its banner if any. Title and
    /// body are escaped.
    pub fn to_html(&self) -> String {
        let toast = format!(
            r#"<div class="toast toast-{}" role="alert"><strong class="toast-title">{}</strong><p class="toast-body">{}</p></div>"#,
            self.level.as_str(),
            escape_html(&self.title),
            escape_html(&self.body)
        );
        match &self.banner {
            Some(banner) => format!("{banner}{toast}"),
            None => toast,
        }
    }

    /// Single-line rendering for terminals and logs. Control characters in
    /// title and body are replaced.
    pub fn to_plain(&self) -> String {
        format!(
            "[{}] {}: {}",
            self.level.as_str(),
            strip_control(&self.title),
            strip_control(&self.body)
        )
    }
}

/// Human-readable rank movement. Ranks count from 1, so a negative change is
/// an improvement.
pub fn rank_movement(rank_change: i32) -> String {
    let places = rank_change.unsigned_abs();
    let noun = if places == 1 { "place" } else { "places" };
    if rank_change < 0 {
        format!("\u{25b2} up {places} {noun}")
    } else if rank_change > 0 {
        format!("\u{25bc} down {places} {noun}")
    } else {
        "unchanged".to_string()
    }
}

/// Accept only `#rgb` or `#rrggbb` so the value is safe inside a style attribute.
pub fn sanitize_team_color(color: &str) -> &str {
    let hex = match color.strip_prefix('#') {
        Some(hex) => hex,
        None => return DEFAULT_TEAM_COLOR,
    };
    if matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit()) {
        color
    } else {
        DEFAULT_TEAM_COLOR
    }
}

/// Banner markup for the first-blood overlay.
pub fn first_blood_html(first_blood: &FirstBlood) -> String {
    format!(
        r#"<div class="first-blood" style="--team-color: {}"><h1 class="first-blood-title">{}</h1><p class="first-blood-player">{}</p><p class="first-blood-team">{}</p><p class="first-blood-challenge">{}</p><p class="first-blood-points">+{}</p></div>"#,
        sanitize_team_color(&first_blood.team_color),
        FIRST_BLOOD_MARKER,
        escape_html(&first_blood.player_name),
        escape_html(&first_blood.team_name),
        escape_html(&first_blood.challenge_name),
        first_blood.points
    )
}
