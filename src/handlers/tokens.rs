use crate::auth::{AuthUser, BasicUser};
use crate::errors::ApiError;
use crate::schemas::{AppState, ErrorResponse};
use axum::{extract::State, http::StatusCode, response::Json};
use sea_orm::ActiveModelTrait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};
use utoipa::ToSchema;

/// Bearer token issued to a user
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    /// 64 hex characters
    pub token: String,
}

/// Issue a bearer token in exchange for basic credentials.
///
/// A token that is still valid for at least another minute is returned again
/// instead of being replaced.
#[utoipa::path(
    post,
    path = "/tokens",
    tag = "tokens",
    security(("basic" = [])),
    responses(
        (status = 201, description = "Token issued", body = TokenResponse),
        (status = 401, description = "Missing or invalid credentials", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, identity))]
pub async fn create_token(
    State(state): State<AppState>,
    BasicUser(mut identity): BasicUser,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    trace!("Entering create_token function for user_id: {}", identity.id);

    let previous = identity.token.clone();
    let token = identity.get_token(state.token_ttl);
    if previous.as_deref() == Some(token.as_str()) {
        debug!("Reusing live token for user {}", identity.id);
    }

    identity.token_changes().update(&state.db).await?;

    info!("Issued token for user {}", identity.id);
    Ok((StatusCode::CREATED, Json(TokenResponse { token })))
}

/// Revoke the bearer token used to authenticate this request
#[utoipa::path(
    delete,
    path = "/tokens",
    tag = "tokens",
    security(("bearer" = [])),
    responses(
        (status = 204, description = "Token revoked"),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, identity))]
pub async fn delete_token(
    State(state): State<AppState>,
    AuthUser(mut identity): AuthUser,
) -> Result<StatusCode, ApiError> {
    trace!("Entering delete_token function for user_id: {}", identity.id);

    identity.revoke_token();
    identity.token_changes().update(&state.db).await?;

    info!("Revoked token for user {}", identity.id);
    Ok(StatusCode::NO_CONTENT)
}
