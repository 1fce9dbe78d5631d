//! Requester authentication extractor.
//!
//! Validates the Bearer token in the Authorization header and resolves
//! whether the requester belongs to the admin group.

use axum::{async_trait, extract::FromRequestParts, http::header, http::request::Parts};
use domain::models::RequestContext;
use domain::services::GroupDirectory;
use shared::jwt::JwtError;

use crate::app::AppState;
use crate::error::ApiError;

/// The authenticated user performing a request.
#[derive(Debug, Clone)]
pub struct Requester(pub RequestContext);

/// Extracts the token from an `Authorization: Bearer <token>` value.
pub fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[async_trait]
impl FromRequestParts<AppState> for Requester {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;

        let token = bearer_token(auth_header).ok_or_else(|| {
            ApiError::Unauthorized("Invalid Authorization header format".to_string())
        })?;

        let claims = state.jwt.validate(token).map_err(|e| match e {
            JwtError::TokenExpired => ApiError::Unauthorized("Token has expired".to_string()),
            _ => ApiError::Unauthorized("Invalid or expired token".to_string()),
        })?;

        let is_admin = state
            .groups
            .is_member(&claims.sub, &state.admin_group)
            .await
            .map_err(|e| ApiError::ServiceUnavailable(format!("Group lookup failed: {}", e)))?;

        tracing::debug!(requester = %claims.sub, is_admin, "Requester authenticated");

        Ok(Self(RequestContext::new(claims.sub, is_admin)))
    }
}
