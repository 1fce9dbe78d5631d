//! Invitation routes.
//!
//! The workflow decides status and body; handlers only translate transport.

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::{
    InviteRequest, InviteResponse, JoinRequest, JoinResponse, TokenCheckQuery,
    TokenCheckResponse,
};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::Requester;
use crate::middleware::metrics::{record_invitation, record_join_attempt};

fn status(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// Invite a new user.
///
/// POST /api/v1/invites
///
/// Requires a Bearer token; the token subject is the inviting user.
pub async fn create_invite(
    State(state): State<AppState>,
    Requester(ctx): Requester,
    payload: Result<Json<InviteRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<InviteResponse>), ApiError> {
    let Json(request) = payload?;

    let outcome = state.workflow.invite(&ctx, request).await;
    record_invitation(outcome.status);

    Ok((status(outcome.status), Json(outcome.body)))
}

/// Check whether a join link is still valid.
///
/// GET /api/v1/invites/join?username=&token=
pub async fn check_token(
    State(state): State<AppState>,
    query: Result<Query<TokenCheckQuery>, QueryRejection>,
) -> Result<Json<TokenCheckResponse>, ApiError> {
    let Query(query) = query?;
    let valid = state.workflow.check(&query.username, &query.token).await;
    Ok(Json(TokenCheckResponse { valid }))
}

/// Accept an invitation and choose a password.
///
/// POST /api/v1/invites/join
pub async fn join(
    State(state): State<AppState>,
    payload: Result<Json<JoinRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<JoinResponse>), ApiError> {
    let Json(request) = payload?;

    let outcome = state.workflow.accept(request).await;
    record_join_attempt(outcome.status);

    Ok((status(outcome.status), Json(outcome.body)))
}
