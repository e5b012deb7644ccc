//! URL derivation for the live channels and the dashboard endpoints.

use common::LiveChannel;
use reqwest::Url;

use crate::error::{ClientError, Result};

/// Base address of a Dojo deployment.
#[derive(Debug, Clone)]
pub struct Endpoints {
    base: Url,
}

impl Endpoints {
    /// Accepts `http://` and `https://` bases. A path on the base is ignored.
    pub fn parse(base: &str) -> Result<Self> {
        let invalid = |reason: String| ClientError::InvalidBaseUrl {
            url: base.to_string(),
            reason,
        };

        let mut url = Url::parse(base).map_err(|e| invalid(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme {:?}", url.scheme())));
        }
        if url.host_str().is_none() {
            return Err(invalid("missing host".into()));
        }
        url.set_path("/");
        url.set_query(None);
        url.set_fragment(None);
        Ok(Self { base: url })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Socket URL for a channel: `http` becomes `ws`, `https` becomes `wss`.
    ///
    /// The token is only attached on the notifications channel; first-blood
    /// announcements are public.
    pub fn websocket(&self, channel: LiveChannel, token: Option<&str>) -> Url {
        let mut url = self.base.clone();
        let scheme = if self.base.scheme() == "https" { "wss" } else { "ws" };
        // http(s) -> ws(s) is always an allowed scheme change for special schemes.
        let _ = url.set_scheme(scheme);
        url.set_path(channel.path());
        if let (LiveChannel::Notifications, Some(token)) = (channel, token) {
            url.query_pairs_mut().append_pair("token", token);
        }
        url
    }

    /// Absolute HTTP URL for a site-relative path, which may carry a query.
    pub fn http(&self, path_and_query: &str) -> Result<Url> {
        self.base
            .join(path_and_query)
            .map_err(|e| ClientError::InvalidBaseUrl {
                url: format!("{}{}", self.base, path_and_query),
                reason: e.to_string(),
            })
    }
}
