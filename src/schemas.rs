use std::collections::BTreeMap;

use chrono::Duration;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi, ToSchema,
};

use crate::handlers::artists::{ArtistResponse, CreateArtistRequest, UpdateArtistRequest};
use crate::handlers::tokens::TokenResponse;
use crate::handlers::users::{CreateUserRequest, UpdateUserRequest, UserResponse};

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// Lifetime of newly issued bearer tokens
    pub token_ttl: Duration,
}

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// HTTP reason phrase, e.g. "Not Found"
    pub error: String,
    /// Field-level messages for validation and uniqueness failures
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<BTreeMap<String, Vec<String>>>,
}

/// Health check response
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// Registers the bearer and basic security schemes referenced by the paths.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
            components.add_security_scheme(
                "basic",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Basic)),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::users::get_users,
        crate::handlers::users::get_user,
        crate::handlers::users::create_user,
        crate::handlers::users::update_user,
        crate::handlers::users::delete_user,
        crate::handlers::tokens::create_token,
        crate::handlers::tokens::delete_token,
        crate::handlers::artists::get_artists,
        crate::handlers::artists::get_artist,
        crate::handlers::artists::create_artist,
        crate::handlers::artists::update_artist,
        crate::handlers::artists::delete_artist,
    ),
    components(
        schemas(
            ErrorResponse,
            HealthResponse,
            UserResponse,
            CreateUserRequest,
            UpdateUserRequest,
            TokenResponse,
            ArtistResponse,
            CreateArtistRequest,
            UpdateArtistRequest,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "users", description = "User accounts"),
        (name = "tokens", description = "Bearer token issue and revocation"),
        (name = "artists", description = "Artists owned by the authenticated user"),
    ),
    info(
        title = "Muckr API",
        description = "Authenticated CRUD API for users and their artists",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;
