//! Authentication extractor.
//!
//! When `AUTH_SECRET` is configured, mutating routes require
//! `Authorization: Bearer <secret>`. Without it every caller is accepted as
//! anonymous.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::error::AppError;
use crate::AppState;

/// Caller allowed to mutate the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    /// The bearer token, or `anonymous` when auth is not configured
    pub token: String,
}

impl AuthUser {
    fn anonymous() -> Self {
        Self {
            token: "anonymous".to_string(),
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());

        let Some(secret) = state.config.auth_secret.as_deref() else {
            return Ok(match auth_header.and_then(|h| h.strip_prefix("Bearer ")) {
                Some(token) if !token.is_empty() => AuthUser {
                    token: token.to_string(),
                },
                _ => AuthUser::anonymous(),
            });
        };

        match auth_header {
            Some(header) => {
                let token = header
                    .strip_prefix("Bearer ")
                    .ok_or(AppError::Unauthorized("Invalid authorization header format"))?;

                if token.is_empty() {
                    return Err(AppError::Unauthorized("Empty bearer token"));
                }
                if token != secret {
                    tracing::warn!("Rejected request with invalid bearer token");
                    return Err(AppError::Unauthorized("Invalid bearer token"));
                }

                Ok(AuthUser {
                    token: token.to_string(),
                })
            }
            None => Err(AppError::Unauthorized("Missing authorization header")),
        }
    }
}
