use crate::auth::{authorize, AuthUser};
use crate::errors::ApiError;
use crate::helpers::pagination::{Page, PaginationQuery};
use crate::schemas::{AppState, ErrorResponse};
use crate::uniqueness::{check_unique_on_create, check_unique_on_update, UniqueField};
use crate::validation::{required, JsonBody, Payload, RecordId, ValidJson};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::Json,
};
use model::entities::artist;
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::ToSchema;
use validator::Validate;

/// Request body for creating an artist
#[derive(Debug, Default, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateArtistRequest {
    /// Artist name, unique among the owner's artists
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(
        required(message = "Missing data for required field."),
        length(min = 1, message = "Shorter than minimum length 1.")
    )]
    pub name: Option<String>,
}

impl Payload for CreateArtistRequest {
    const FIELDS: &'static [&'static str] = &["name"];
}

/// Request body for renaming an artist
#[derive(Debug, Default, Deserialize, Serialize, ToSchema, Validate)]
pub struct UpdateArtistRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "Shorter than minimum length 1."))]
    pub name: Option<String>,
}

impl Payload for UpdateArtistRequest {
    const FIELDS: &'static [&'static str] = &["name"];
}

/// Artist response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ArtistResponse {
    pub id: i32,
    pub name: String,
    /// Owning user
    pub user_id: i32,
}

impl From<artist::Model> for ArtistResponse {
    fn from(model: artist::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            user_id: model.user_id,
        }
    }
}

/// Get a page of the caller's artists
#[utoipa::path(
    get,
    path = "/artists",
    tag = "artists",
    params(PaginationQuery),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Artists retrieved successfully", body = Vec<ArtistResponse>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, identity))]
pub async fn get_artists(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    page: Page,
) -> Result<Json<Vec<ArtistResponse>>, ApiError> {
    trace!("Entering get_artists function for user_id: {}", identity.id);

    debug!("Fetching artists - page: {}, per_page: {}", page.number, page.size);

    let artists = page
        .apply(artist::Entity::find_by_owner(identity.id).order_by_asc(artist::Column::Id))
        .all(&state.db)
        .await?;

    info!("Successfully retrieved {} artists for user {}", artists.len(), identity.id);
    Ok(Json(artists.into_iter().map(ArtistResponse::from).collect()))
}

/// Get a specific artist by ID
#[utoipa::path(
    get,
    path = "/artists/{artist_id}",
    tag = "artists",
    params(
        ("artist_id" = i32, Path, description = "Artist ID"),
    ),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Artist retrieved successfully", body = ArtistResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "Artist not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, identity))]
pub async fn get_artist(
    RecordId(artist_id): RecordId,
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Result<Json<ArtistResponse>, ApiError> {
    trace!("Entering get_artist function for artist_id: {}", artist_id);

    let Some(artist_model) = artist::Entity::find_by_id(artist_id).one(&state.db).await? else {
        warn!("Artist with ID {} not found", artist_id);
        return Err(ApiError::NotFound);
    };
    authorize(&identity, artist_model.user_id)?;

    Ok(Json(ArtistResponse::from(artist_model)))
}

/// Create an artist owned by the caller
#[utoipa::path(
    post,
    path = "/artists",
    tag = "artists",
    request_body = CreateArtistRequest,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Artist created successfully", body = ArtistResponse,
            headers(("Location" = String, description = "URL of the new artist"))),
        (status = 400, description = "Caller already has an artist with this name", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 422, description = "Invalid request body", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, identity, payload))]
pub async fn create_artist(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    ValidJson(payload): ValidJson<CreateArtistRequest>,
) -> Result<(StatusCode, [(header::HeaderName, String); 1], Json<ArtistResponse>), ApiError> {
    trace!("Entering create_artist function for user_id: {}", identity.id);

    let name = required(payload.name, "name")?;
    debug!("Creating artist with name: {}", name);

    let txn = state.db.begin().await?;

    check_unique_on_create(
        &txn,
        artist::Entity::find_by_owner(identity.id),
        &[UniqueField::new("name", artist::Column::Name, Some(name.as_str()))],
    )
    .await?;

    let artist_model = artist::ActiveModel {
        name: Set(name),
        user_id: Set(identity.id),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    info!(
        "Artist created successfully with ID: {} for user {}",
        artist_model.id, identity.id
    );
    let location = format!("/artists/{}", artist_model.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(ArtistResponse::from(artist_model)),
    ))
}

/// Update an artist
#[utoipa::path(
    put,
    path = "/artists/{artist_id}",
    tag = "artists",
    params(
        ("artist_id" = i32, Path, description = "Artist ID"),
    ),
    request_body = UpdateArtistRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Artist updated successfully", body = ArtistResponse),
        (status = 400, description = "Owner already has an artist with this name", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "Artist not found", body = ErrorResponse),
        (status = 422, description = "Invalid request body", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, identity, body))]
pub async fn update_artist(
    RecordId(artist_id): RecordId,
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    body: JsonBody<UpdateArtistRequest>,
) -> Result<Json<ArtistResponse>, ApiError> {
    trace!("Entering update_artist function for artist_id: {}", artist_id);

    let txn = state.db.begin().await?;

    let Some(existing_artist) = artist::Entity::find_by_id(artist_id).one(&txn).await? else {
        warn!("Artist with ID {} not found for update", artist_id);
        return Err(ApiError::NotFound);
    };
    authorize(&identity, existing_artist.user_id)?;
    let payload = body.parse()?;

    // Names are unique per owner, which differs from the caller when an admin edits
    check_unique_on_update(
        &txn,
        artist::Entity::find_by_owner(existing_artist.user_id),
        artist::Column::Id,
        existing_artist.id,
        &[UniqueField::new("name", artist::Column::Name, payload.name.as_deref())],
    )
    .await?;

    let mut artist_active: artist::ActiveModel = existing_artist.into();
    if let Some(name) = payload.name {
        artist_active.name = Set(name);
    }

    let updated_artist = artist_active.update(&txn).await?;
    txn.commit().await?;

    info!("Artist with ID {} updated successfully", artist_id);
    Ok(Json(ArtistResponse::from(updated_artist)))
}

/// Delete an artist
#[utoipa::path(
    delete,
    path = "/artists/{artist_id}",
    tag = "artists",
    params(
        ("artist_id" = i32, Path, description = "Artist ID"),
    ),
    security(("bearer" = [])),
    responses(
        (status = 204, description = "Artist deleted successfully"),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "Artist not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, identity))]
pub async fn delete_artist(
    RecordId(artist_id): RecordId,
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Result<StatusCode, ApiError> {
    trace!("Entering delete_artist function for artist_id: {}", artist_id);

    let txn = state.db.begin().await?;

    let Some(existing_artist) = artist::Entity::find_by_id(artist_id).one(&txn).await? else {
        warn!("Artist with ID {} not found for deletion", artist_id);
        return Err(ApiError::NotFound);
    };
    authorize(&identity, existing_artist.user_id)?;

    artist::Entity::delete_by_id(existing_artist.id).exec(&txn).await?;
    txn.commit().await?;

    info!("Artist with ID {} deleted successfully", artist_id);
    Ok(StatusCode::NO_CONTENT)
}
