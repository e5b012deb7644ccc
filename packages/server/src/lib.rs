pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod hub;
pub mod models;
pub mod routes;
pub mod state;
pub mod utils;

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_scalar::{Scalar, Servable as ScalarServable};

use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Dojo Live Relay API",
        version = "1.0.0",
        description = "Real-time notification relay for the Dojo CTF platform"
    ),
    paths(handlers::broadcast::broadcast, handlers::health::health),
    components(schemas(
        error::ErrorBody,
        models::broadcast::BroadcastRequest,
        models::broadcast::BroadcastResponse,
        models::health::HealthResponse,
    )),
    tags(
        (name = "Broadcast", description = "Publishing messages to live connections"),
        (name = "Health", description = "Service health"),
    ),
    modifiers(&SecurityAddon),
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_default();
        components.add_security_scheme(
            "publish_key",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-Publish-Key"))),
        );
    }
}

/// Build the application router.
pub fn build_router(state: AppState) -> axum::Router {
    routes::routes(&state.config.server.cors)
        .with_state(state)
        .merge(Scalar::with_url("/scalar", ApiDoc::openapi()))
}
