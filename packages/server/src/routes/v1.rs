use axum::{Router, routing::post};

use crate::handlers;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/broadcast", post(handlers::broadcast::broadcast))
}
