use common::ReconnectPolicy;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct ClientConfig {
    /// Site address the socket and dashboard URLs are derived from.
    pub base_url: String,
    /// Access token for the notifications channel and the dashboard endpoints.
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub reconnect: ReconnectPolicy,
    /// Bound on opening the socket, handshake included. Default: 10000.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Bound on each dashboard request. Default: 10000.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Seconds between keepalive pings. 0 disables them. Default: 30.
    #[serde(default = "default_keepalive_secs")]
    pub keepalive_secs: u64,
    /// Event whose first-blood announcements to subscribe to.
    #[serde(default)]
    pub event_id: Option<i64>,
    /// Refresh dashboard panels after live events. Default: true.
    #[serde(default = "default_dashboard")]
    pub dashboard: bool,
    /// Toasts kept visible at once. Default: 5.
    #[serde(default = "default_max_toasts")]
    pub max_toasts: usize,
}

fn default_keepalive_secs() -> u64 {
    30
}
fn default_connect_timeout_ms() -> u64 {
    10_000
}
fn default_request_timeout_ms() -> u64 {
    10_000
}
fn default_dashboard() -> bool {
    true
}
fn default_max_toasts() -> usize {
    5
}

impl ClientConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("base_url", "http://127.0.0.1:8000")?
            .set_default("connect_timeout_ms", default_connect_timeout_ms())?
            .set_default("request_timeout_ms", default_request_timeout_ms())?
            .set_default("keepalive_secs", default_keepalive_secs())?
            .set_default("dashboard", default_dashboard())?
            .set_default("max_toasts", default_max_toasts() as u64)?
            // Load from config/dojo-live.toml
            .add_source(File::with_name("config/dojo-live").required(false))
            // Override from environment (e.g., DOJO_LIVE__RECONNECT__MAX_ATTEMPTS)
            .add_source(Environment::with_prefix("DOJO_LIVE").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
