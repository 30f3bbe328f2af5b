//! Request authentication and the owner-or-admin authorization guard.
//!
//! Handlers receive the resolved identity as an extractor value:
//! [`AuthUser`] for `Authorization: Bearer <token>` and [`BasicUser`] for
//! `Authorization: Basic <base64(username:password)>`.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use base64::{engine::general_purpose::STANDARD, Engine};
use model::entities::user::{self, credentials::verify_unknown_user};
use tracing::{debug, warn};

use crate::errors::{ApiError, AuthScheme};
use crate::schemas::AppState;

/// Identity resolved from a bearer token.
pub struct AuthUser(pub user::Model);

/// Identity resolved from basic username/password credentials.
pub struct BasicUser(pub user::Model);

/// Owner-or-admin predicate applied before reading or mutating a record.
pub fn can_access(identity: &user::Model, owner_id: i32) -> bool {
    identity.is_admin || identity.id == owner_id
}

/// Fail with "not found" when `identity` may not touch a record owned by
/// `owner_id`, so that records of other users stay invisible.
pub fn authorize(identity: &user::Model, owner_id: i32) -> Result<(), ApiError> {
    if can_access(identity, owner_id) {
        Ok(())
    } else {
        warn!(user_id = identity.id, owner_id, "Access denied to foreign record");
        Err(ApiError::NotFound)
    }
}

/// Credentials following `scheme` in the `Authorization` header.
fn credentials<'a>(headers: &'a HeaderMap, scheme: &str) -> Option<&'a str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (given, credentials) = value.split_once(' ')?;
    given
        .eq_ignore_ascii_case(scheme)
        .then(|| credentials.trim())
}

/// Decode the `username:password` pair of a basic credential.
fn decode_basic(encoded: &str) -> Option<(String, String)> {
    let decoded = STANDARD.decode(encoded).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let unauthorized = || ApiError::Unauthorized(AuthScheme::Bearer);

        let Some(token) = credentials(&parts.headers, "Bearer") else {
            debug!("Request carries no bearer token");
            return Err(unauthorized());
        };

        match user::Entity::check_token(&state.db, token).await? {
            Some(user) => {
                debug!(user_id = user.id, "Authenticated bearer token");
                Ok(AuthUser(user))
            }
            None => {
                warn!("Rejected unknown or expired bearer token");
                Err(unauthorized())
            }
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for BasicUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let unauthorized = || ApiError::Unauthorized(AuthScheme::Basic);

        let Some((username, password)) =
            credentials(&parts.headers, "Basic").and_then(decode_basic)
        else {
            debug!("Request carries no basic credentials");
            return Err(unauthorized());
        };

        // Unknown user and wrong password are reported identically and cost
        // one Argon2 verification each
        let user = match user::Entity::find_by_username(&username).one(&state.db).await? {
            Some(user) => user.check_password(&password).then_some(user),
            None => {
                verify_unknown_user(&password);
                None
            }
        };

        match user {
            Some(user) => {
                debug!(user_id = user.id, "Authenticated basic credentials");
                Ok(BasicUser(user))
            }
            None => {
                warn!(%username, "Rejected basic credentials");
                Err(unauthorized())
            }
        }
    }
}
