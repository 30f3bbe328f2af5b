//! Error type returned by every handler and extractor.
//!
//! All failures are turned into a JSON body of the shape
//! `{"error": "<reason phrase>", "details": {field: [messages]}}` where
//! `details` is only present for field-level failures.

use std::collections::BTreeMap;

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use model::CredentialError;
use sea_orm::DbErr;
use thiserror::Error;
use tracing::{debug, error};

use crate::schemas::ErrorResponse;

/// Field name to the list of messages describing what is wrong with it.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Key used for errors that concern the body as a whole.
pub const SCHEMA_FIELD: &str = "_schema";

/// Authentication scheme announced in the `WWW-Authenticate` challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    Basic,
    Bearer,
}

impl AuthScheme {
    fn challenge(self) -> &'static str {
        match self {
            AuthScheme::Basic => "Basic realm=\"Authentication Required\"",
            AuthScheme::Bearer => "Bearer realm=\"Authentication Required\"",
        }
    }
}

/// API error types
#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing, malformed, unknown or expired credentials
    #[error("Authentication required")]
    Unauthorized(AuthScheme),

    /// No such record, or the caller may not see it
    #[error("Resource not found")]
    NotFound,

    /// The route exists but not for this HTTP method
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// The request body could not be parsed at all
    #[error("Malformed request: {0}")]
    BadRequest(String),

    /// Schema-level validation failed
    #[error("Validation failed: {0:?}")]
    Validation(FieldErrors),

    /// A value collides with an existing record in its uniqueness scope
    #[error("Unique constraint violated: {0:?}")]
    Conflict(FieldErrors),

    /// Anything else; details are logged but never sent to the client
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// A validation failure for a single field.
    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        let mut details = FieldErrors::new();
        details.insert(field.to_string(), vec![message.into()]);
        ApiError::Validation(details)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::BadRequest(_) | ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DbErr> for ApiError {
    fn from(err: DbErr) -> Self {
        ApiError::Internal(format!("Database error: {err}"))
    }
}

impl From<CredentialError> for ApiError {
    fn from(err: CredentialError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = status.canonical_reason().unwrap_or("Error").to_string();

        let (details, challenge) = match self {
            ApiError::Validation(details) | ApiError::Conflict(details) => (Some(details), None),
            ApiError::Unauthorized(scheme) => (None, Some(scheme.challenge())),
            ApiError::BadRequest(reason) => {
                debug!(%reason, "Rejected malformed request");
                (None, None)
            }
            ApiError::Internal(reason) => {
                error!(%reason, "Internal server error");
                (None, None)
            }
            ApiError::NotFound | ApiError::MethodNotAllowed => (None, None),
        };

        let mut response = (status, Json(ErrorResponse { error, details })).into_response();
        if let Some(challenge) = challenge {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static(challenge));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::Unauthorized(AuthScheme::Bearer).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::MethodNotAllowed.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(ApiError::Conflict(FieldErrors::new()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::invalid_field("id", "Unknown field.").status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::Internal("boom".to_string()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_unauthorized_carries_challenge() {
        let response = ApiError::Unauthorized(AuthScheme::Basic).into_response();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Basic realm=\"Authentication Required\""
        );
    }

    #[tokio::test]
    async fn test_internal_error_hides_reason() {
        let response = ApiError::from(DbErr::Custom("secret table".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body, serde_json::json!({"error": "Internal Server Error"}));
    }
}
