mod v1;

use std::time::Duration;

use axum::{Router, http::HeaderValue, routing::get};
use tower_http::cors::{Any, CorsLayer};

use crate::config::CorsConfig;
use crate::handlers;
use crate::state::AppState;

pub fn routes(cors: &CorsConfig) -> Router<AppState> {
    Router::new()
        .route("/ws/notifications/", get(handlers::ws::notifications))
        .route("/ws/first-blood/", get(handlers::ws::first_blood))
        .route("/health", get(handlers::health::health))
        .nest("/api/v1", v1::routes().layer(cors_layer(cors)))
}

/// CORS for the HTTP API. An empty origin list allows any origin.
fn cors_layer(cors: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = cors
        .allow_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let layer = CorsLayer::new()
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(cors.max_age));

    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(origins)
    }
}
