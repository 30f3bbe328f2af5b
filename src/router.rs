use crate::handlers::{
    artists::{create_artist, delete_artist, get_artist, get_artists, update_artist},
    health::health_check,
    tokens::{create_token, delete_token},
    users::{create_user, delete_user, get_user, get_users, update_user},
};
use crate::schemas::{ApiDoc, AppState};
use crate::errors::ApiError;
use axum::{
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check).fallback(method_not_allowed))
        // User routes; signup is the only unauthenticated one
        .route(
            "/users",
            post(create_user).get(get_users).fallback(method_not_allowed),
        )
        .route(
            "/users/:user_id",
            get(get_user)
                .put(update_user)
                .delete(delete_user)
                .fallback(method_not_allowed),
        )
        // Token issue (basic auth) and revocation (bearer auth)
        .route(
            "/tokens",
            post(create_token).delete(delete_token).fallback(method_not_allowed),
        )
        // Artist routes
        .route(
            "/artists",
            post(create_artist).get(get_artists).fallback(method_not_allowed),
        )
        .route(
            "/artists/:artist_id",
            get(get_artist)
                .put(update_artist)
                .delete(delete_artist)
                .fallback(method_not_allowed),
        )
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .fallback(not_found)
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}
