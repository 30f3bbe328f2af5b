use crate::auth::{authorize, AuthUser};
use crate::errors::{ApiError, AuthScheme};
use crate::helpers::pagination::{Page, PaginationQuery};
use crate::schemas::{AppState, ErrorResponse};
use crate::uniqueness::{check_unique_on_create, check_unique_on_update, UniqueField};
use crate::validation::{required, JsonBody, Payload, RecordId, ValidJson};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::Json,
};
use model::entities::{artist, user};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::ToSchema;
use validator::Validate;

/// Request body for creating a new user
#[derive(Debug, Default, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateUserRequest {
    /// Username (must be unique)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(
        required(message = "Missing data for required field."),
        length(min = 1, message = "Shorter than minimum length 1.")
    )]
    pub username: Option<String>,
    /// Email address (must be unique)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(
        required(message = "Missing data for required field."),
        length(min = 1, message = "Shorter than minimum length 1."),
        email(message = "Not a valid email address.")
    )]
    pub email: Option<String>,
    /// Password, stored only as a salted hash
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(
        required(message = "Missing data for required field."),
        length(min = 1, message = "Shorter than minimum length 1.")
    )]
    pub password: Option<String>,
}

impl Payload for CreateUserRequest {
    const FIELDS: &'static [&'static str] = &["username", "email", "password"];
}

/// Request body for updating a user; absent fields are left unchanged
#[derive(Debug, Default, Deserialize, Serialize, ToSchema, Validate)]
pub struct UpdateUserRequest {
    /// Username (must be unique)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "Shorter than minimum length 1."))]
    pub username: Option<String>,
    /// Email address (must be unique)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(
        length(min = 1, message = "Shorter than minimum length 1."),
        email(message = "Not a valid email address.")
    )]
    pub email: Option<String>,
    /// New password
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "Shorter than minimum length 1."))]
    pub password: Option<String>,
}

impl Payload for UpdateUserRequest {
    const FIELDS: &'static [&'static str] = &["username", "email", "password"];
}

/// User response model. Credentials are never serialized.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
}

impl From<user::Model> for UserResponse {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            is_admin: model.is_admin,
        }
    }
}

/// Get a page of users (admin only)
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    params(PaginationQuery),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Users retrieved successfully", body = Vec<UserResponse>),
        (status = 401, description = "Missing or invalid token, or not an admin", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, identity))]
pub async fn get_users(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    page: Page,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    trace!("Entering get_users function");

    if !identity.is_admin {
        warn!(user_id = identity.id, "Non-admin user attempted to list users");
        return Err(ApiError::Unauthorized(AuthScheme::Bearer));
    }

    debug!("Fetching users - page: {}, per_page: {}", page.number, page.size);

    let users = page
        .apply(user::Entity::find().order_by_asc(user::Column::Id))
        .all(&state.db)
        .await?;

    info!("Successfully retrieved {} users", users.len());
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// Get a specific user by ID
#[utoipa::path(
    get,
    path = "/users/{user_id}",
    tag = "users",
    params(
        ("user_id" = i32, Path, description = "User ID"),
    ),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "User retrieved successfully", body = UserResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, identity))]
pub async fn get_user(
    RecordId(user_id): RecordId,
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Result<Json<UserResponse>, ApiError> {
    trace!("Entering get_user function for user_id: {}", user_id);

    let Some(user_model) = user::Entity::find_by_id(user_id).one(&state.db).await? else {
        warn!("User with ID {} not found", user_id);
        return Err(ApiError::NotFound);
    };
    authorize(&identity, user_model.id)?;

    info!("Successfully retrieved user with ID: {}", user_model.id);
    Ok(Json(UserResponse::from(user_model)))
}

/// Create a new user (signup)
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created successfully", body = UserResponse,
            headers(("Location" = String, description = "URL of the new user"))),
        (status = 400, description = "Username or email already taken", body = ErrorResponse),
        (status = 422, description = "Invalid request body", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<CreateUserRequest>,
) -> Result<(StatusCode, [(header::HeaderName, String); 1], Json<UserResponse>), ApiError> {
    trace!("Entering create_user function");

    let username = required(payload.username, "username")?;
    let email = required(payload.email, "email")?;
    let password = required(payload.password, "password")?;
    debug!("Creating user with username: {}", username);

    let txn = state.db.begin().await?;

    check_unique_on_create(
        &txn,
        user::Entity::find(),
        &[
            UniqueField::new("username", user::Column::Username, Some(username.as_str())),
            UniqueField::new("email", user::Column::Email, Some(email.as_str())),
        ],
    )
    .await?;

    let mut new_user = user::ActiveModel {
        username: Set(username),
        email: Set(email),
        is_admin: Set(false),
        ..Default::default()
    };
    new_user.set_password(&password)?;

    trace!("Attempting to insert new user into database");
    let user_model = new_user.insert(&txn).await?;
    txn.commit().await?;

    info!(
        "User created successfully with ID: {}, username: {}",
        user_model.id, user_model.username
    );
    let location = format!("/users/{}", user_model.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(UserResponse::from(user_model)),
    ))
}

/// Update a user
#[utoipa::path(
    put,
    path = "/users/{user_id}",
    tag = "users",
    params(
        ("user_id" = i32, Path, description = "User ID"),
    ),
    request_body = UpdateUserRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "User updated successfully", body = UserResponse),
        (status = 400, description = "Username or email already taken", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 422, description = "Invalid request body", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, identity, body))]
pub async fn update_user(
    RecordId(user_id): RecordId,
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    body: JsonBody<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    trace!("Entering update_user function for user_id: {}", user_id);

    let txn = state.db.begin().await?;

    let Some(existing_user) = user::Entity::find_by_id(user_id).one(&txn).await? else {
        warn!("User with ID {} not found for update", user_id);
        return Err(ApiError::NotFound);
    };
    authorize(&identity, existing_user.id)?;
    let payload = body.parse()?;

    check_unique_on_update(
        &txn,
        user::Entity::find(),
        user::Column::Id,
        existing_user.id,
        &[
            UniqueField::new("username", user::Column::Username, payload.username.as_deref()),
            UniqueField::new("email", user::Column::Email, payload.email.as_deref()),
        ],
    )
    .await?;

    let mut user_active: user::ActiveModel = existing_user.into();
    let mut updated_fields = Vec::new();

    if let Some(username) = payload.username {
        user_active.username = Set(username);
        updated_fields.push("username");
    }
    if let Some(email) = payload.email {
        user_active.email = Set(email);
        updated_fields.push("email");
    }
    if let Some(password) = payload.password {
        user_active.set_password(&password)?;
        updated_fields.push("password");
    }

    let updated_user = user_active.update(&txn).await?;
    txn.commit().await?;

    info!(
        "User with ID {} updated successfully. Updated fields: {}",
        user_id,
        if updated_fields.is_empty() { "none".to_string() } else { updated_fields.join(", ") }
    );
    Ok(Json(UserResponse::from(updated_user)))
}

/// Delete a user together with their artists and token
#[utoipa::path(
    delete,
    path = "/users/{user_id}",
    tag = "users",
    params(
        ("user_id" = i32, Path, description = "User ID"),
    ),
    security(("bearer" = [])),
    responses(
        (status = 204, description = "User deleted successfully"),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, identity))]
pub async fn delete_user(
    RecordId(user_id): RecordId,
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Result<StatusCode, ApiError> {
    trace!("Entering delete_user function for user_id: {}", user_id);

    let txn = state.db.begin().await?;

    let Some(existing_user) = user::Entity::find_by_id(user_id).one(&txn).await? else {
        warn!("User with ID {} not found for deletion", user_id);
        return Err(ApiError::NotFound);
    };
    authorize(&identity, existing_user.id)?;

    let artists = artist::Entity::delete_many()
        .filter(artist::Column::UserId.eq(existing_user.id))
        .exec(&txn)
        .await?;
    debug!("Deleted {} artists owned by user {}", artists.rows_affected, user_id);

    user::Entity::delete_by_id(existing_user.id).exec(&txn).await?;
    txn.commit().await?;

    info!("User with ID {} deleted successfully", user_id);
    Ok(StatusCode::NO_CONTENT)
}
