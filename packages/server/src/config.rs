use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

/// Where the RS256 public key comes from and what the tokens must claim.
#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// Path to the PEM file. Takes precedence over `public_key_pem`.
    #[serde(default)]
    pub public_key_path: Option<PathBuf>,
    /// PEM content, typically injected through the environment.
    #[serde(default)]
    pub public_key_pem: Option<String>,
    /// Expected `iss` claim. Default: "cyber-sentinels-club".
    #[serde(default = "default_issuer")]
    pub issuer: String,
    /// Expected `aud` claim. Default: "cyber-sentinels-ctf".
    #[serde(default = "default_audience")]
    pub audience: String,
    /// Shared secret required in `X-Publish-Key` by the broadcast endpoint.
    /// Unset means the endpoint is open (local development only).
    #[serde(default)]
    pub publish_key: Option<String>,
}

fn default_issuer() -> String {
    "cyber-sentinels-club".into()
}
fn default_audience() -> String {
    "cyber-sentinels-ctf".into()
}

/// Relay hub tuning.
#[derive(Debug, Deserialize, Clone)]
pub struct HubConfig {
    /// Outbound frames buffered per connection before new ones are dropped. Default: 64.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_queue_capacity() -> usize {
    64
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub hub: HubConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8001)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("auth.issuer", default_issuer())?
            .set_default("auth.audience", default_audience())?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., DOJO__AUTH__PUBLIC_KEY_PATH)
            .add_source(Environment::with_prefix("DOJO").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
