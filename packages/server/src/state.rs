use std::sync::Arc;

use crate::config::AppConfig;
use crate::hub::Hub;
use crate::utils::jwt::TokenVerifier;

#[derive(Clone)]
pub struct AppState {
    pub hub: Arc<Hub>,
    pub verifier: Arc<TokenVerifier>,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(config: AppConfig, verifier: TokenVerifier) -> Self {
        Self {
            hub: Arc::new(Hub::new(config.hub.queue_capacity)),
            verifier: Arc::new(verifier),
            config,
        }
    }
}
