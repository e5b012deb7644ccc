use axum::{
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

/// Authenticated member extracted from a club-issued token.
///
/// Browsers cannot set headers on a WebSocket handshake, so the token is
/// taken from the `token` query parameter when no `Authorization: Bearer`
/// header is present.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i64,
    pub username: String,
    pub team_ids: Vec<i64>,
}

#[derive(Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = match parts.headers.get("Authorization") {
            Some(value) => value
                .to_str()
                .ok()
                .and_then(|v| v.strip_prefix("Bearer "))
                .map(str::to_owned)
                .ok_or(AppError::TokenInvalid)?,
            None => Query::<TokenQuery>::try_from_uri(&parts.uri)
                .ok()
                .and_then(|Query(q)| q.token)
                .filter(|t| !t.is_empty())
                .ok_or(AppError::TokenMissing)?,
        };

        let claims = state.verifier.verify(&token).map_err(|e| {
            tracing::debug!(error = %e, "Rejected token");
            AppError::TokenInvalid
        })?;

        Ok(AuthUser {
            user_id: claims.user_id,
            username: claims.username,
            team_ids: claims.teams,
        })
    }
}

/// Holder of the publish key, required by the broadcast endpoint.
pub struct Publisher;

impl FromRequestParts<AppState> for Publisher {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.config.auth.publish_key.as_deref() else {
            return Ok(Publisher);
        };

        let provided = parts
            .headers
            .get("X-Publish-Key")
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::TokenMissing)?;

        if constant_time_eq(provided.as_bytes(), expected.as_bytes()) {
            Ok(Publisher)
        } else {
            Err(AppError::PermissionDenied)
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
