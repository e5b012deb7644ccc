//! The default [`LiveHandler`]: toasts, unread counter and dashboard refresh.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use common::{
    EventStateChange, FirstBlood, InstanceStatus, LiveChannel, MessageKind, NotificationPayload,
    ScoreboardUpdate, ServerMessage, SubmissionResult, Toast, ToastLevel,
};
use tracing::{debug, error, info};

use crate::dashboard::Dashboard;
use crate::dispatch::LiveHandler;
use crate::error::ClientError;
use crate::toast::ToastTray;

type ToastCallback = Box<dyn Fn(&Toast) + Send + Sync>;

/// Presents live messages to the user.
pub struct LiveSession {
    tray: ToastTray,
    dashboard: Option<Arc<Dashboard>>,
    unread: AtomicU64,
    on_toast: Option<ToastCallback>,
}

impl LiveSession {
    pub fn new(tray: ToastTray) -> Self {
        Self {
            tray,
            dashboard: None,
            unread: AtomicU64::new(0),
            on_toast: None,
        }
    }

    pub fn with_dashboard(mut self, dashboard: Arc<Dashboard>) -> Self {
        self.dashboard = Some(dashboard);
        self
    }

    /// Called with every toast as it is shown.
    pub fn on_toast(mut self, callback: impl Fn(&Toast) + Send + Sync + 'static) -> Self {
        self.on_toast = Some(Box::new(callback));
        self
    }

    pub fn tray(&self) -> &ToastTray {
        &self.tray
    }

    pub fn unread_count(&self) -> u64 {
        self.unread.load(Ordering::Relaxed)
    }

    fn show(&self, toast: Toast) {
        if let Some(callback) = &self.on_toast {
            callback(&toast);
        }
        self.tray.show(toast);
    }

    fn present(&self, message: &ServerMessage) {
        if let Some(toast) = Toast::from_message(message) {
            self.show(toast);
        }
    }

    /// Refresh the panels for `kind` in the background so that a slow
    /// polling endpoint never holds up the frame loop.
    fn refresh(&self, kind: MessageKind) {
        let Some(dashboard) = &self.dashboard else {
            return;
        };
        let dashboard = Arc::clone(dashboard);
        tokio::spawn(async move {
            let refreshed = dashboard.refresh_for(kind).await;
            debug!(%kind, refreshed, "Dashboard refresh finished");
        });
    }
}

#[async_trait]
impl LiveHandler for LiveSession {
    async fn on_notification(&self, notification: NotificationPayload) {
        self.show(Toast::notification(&notification));
    }

    async fn on_notification_created(&self, notification: NotificationPayload) {
        self.unread.fetch_add(1, Ordering::Relaxed);
        self.show(Toast::notification(&notification));
    }

    async fn on_unread_count(&self, unread_count: u64) {
        self.unread.store(unread_count, Ordering::Relaxed);
    }

    async fn on_event_state_change(&self, change: EventStateChange) {
        self.show(Toast::event_state(&change));
    }

    async fn on_submission_result(&self, result: SubmissionResult) {
        self.present(&ServerMessage::SubmissionResult(result));
        self.refresh(MessageKind::SubmissionResult);
    }

    async fn on_instance_status(&self, status: InstanceStatus) {
        self.present(&ServerMessage::InstanceStatus(status));
        self.refresh(MessageKind::InstanceStatus);
    }

    async fn on_scoreboard_update(&self, update: ScoreboardUpdate) {
        self.present(&ServerMessage::ScoreboardUpdate(update));
        self.refresh(MessageKind::ScoreboardUpdate);
    }

    async fn on_first_blood(&self, first_blood: FirstBlood) {
        self.show(Toast::first_blood(&first_blood));
        self.refresh(MessageKind::FirstBlood);
    }

    async fn on_connected(&self, channel: LiveChannel) {
        info!(%channel, "Connected to live channel");
        self.show(Toast::new(
            ToastLevel::Info,
            "Connected",
            format!("Live {channel} connected"),
        ));
    }

    async fn on_connection_error(&self, channel: LiveChannel, error: &ClientError) {
        self.show(Toast::new(
            ToastLevel::Error,
            "Connection error",
            format!("Live {channel}: {error}"),
        ));
    }

    async fn on_gave_up(&self, channel: LiveChannel, attempts: u32) {
        error!(%channel, attempts, "Live channel disconnected permanently");
        self.show(Toast::new(
            ToastLevel::Warning,
            "Disconnected",
            format!("Live {channel} stopped after {attempts} reconnect attempts"),
        ));
    }
}
