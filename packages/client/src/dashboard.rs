//! Dashboard panels refreshed from the HTTP polling endpoints after live events.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use common::MessageKind;
use futures::future::join_all;
use serde_json::Value;
use tracing::{debug, warn};

use crate::endpoint::Endpoints;
use crate::error::{ClientError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Panel {
    Stats,
    Scoreboard,
    Instances,
    Submissions,
}

impl Panel {
    pub const ALL: [Panel; 4] = [
        Panel::Stats,
        Panel::Scoreboard,
        Panel::Instances,
        Panel::Submissions,
    ];

    /// Site-relative polling endpoint.
    pub fn path(self) -> &'static str {
        match self {
            Panel::Stats => "/dojo/api/dashboard-stats/",
            Panel::Scoreboard => "/dojo/api/dashboard-scoreboard/",
            Panel::Instances => "/dojo/api/instances/",
            Panel::Submissions => "/dojo/api/submissions/my_submissions/?limit=10",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Panel::Stats => "stats",
            Panel::Scoreboard => "scoreboard",
            Panel::Instances => "instances",
            Panel::Submissions => "submissions",
        }
    }
}

/// Panels to refresh after a message of the given kind.
pub fn panels_for(kind: MessageKind) -> &'static [Panel] {
    match kind {
        MessageKind::SubmissionResult => &[Panel::Stats, Panel::Scoreboard, Panel::Submissions],
        MessageKind::InstanceStatus => &[Panel::Instances],
        MessageKind::ScoreboardUpdate => &[Panel::Stats, Panel::Scoreboard],
        MessageKind::FirstBlood => &[Panel::Scoreboard],
        MessageKind::Notification
        | MessageKind::NotificationCreated
        | MessageKind::UnreadCount
        | MessageKind::EventStateChange
        | MessageKind::Pong => &[],
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PanelState {
    pub data: Value,
    pub refreshed_at: DateTime<Utc>,
}

/// Last known contents of each panel.
pub struct Dashboard {
    http: reqwest::Client,
    endpoints: Endpoints,
    token: Option<String>,
    panels: Mutex<BTreeMap<Panel, PanelState>>,
}

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

impl Dashboard {
    /// Every request, connect through body, is bounded by `timeout`.
    pub fn new(endpoints: Endpoints, token: Option<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            endpoints,
            token,
            panels: Mutex::new(BTreeMap::new()),
        })
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<Panel, PanelState>> {
        self.panels.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetch a panel's JSON without storing it.
    pub async fn fetch(&self, panel: Panel) -> Result<Value> {
        let url = self.endpoints.http(panel.path())?;
        let mut request = self.http.get(url.clone());
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                endpoint: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.json().await?)
    }

    /// Replace a panel with fresh data. On failure the panel keeps its
    /// previous contents and `false` is returned.
    pub async fn refresh(&self, panel: Panel) -> bool {
        match self.fetch(panel).await {
            Ok(data) => {
                self.lock().insert(
                    panel,
                    PanelState {
                        data,
                        refreshed_at: Utc::now(),
                    },
                );
                debug!(panel = panel.as_str(), "Panel refreshed");
                true
            }
            Err(e) => {
                warn!(panel = panel.as_str(), error = %e, "Panel refresh failed; keeping stale data");
                false
            }
        }
    }

    /// Refresh every panel mapped to `kind` concurrently. Returns how many succeeded.
    pub async fn refresh_for(&self, kind: MessageKind) -> usize {
        let panels = panels_for(kind);
        if panels.is_empty() {
            return 0;
        }
        join_all(panels.iter().map(|panel| self.refresh(*panel)))
            .await
            .into_iter()
            .filter(|ok| *ok)
            .count()
    }

    pub fn panel(&self, panel: Panel) -> Option<PanelState> {
        self.lock().get(&panel).cloned()
    }
}
