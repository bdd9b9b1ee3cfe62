use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};

use crate::middleware::{HeroForm, IdParam, ListParams};
use crate::service::image_store::DEFAULT_CONTENT_TYPE;
use crate::types::{CreatedResponse, MessageResponse, SuperheroView};
use crate::{RegistryError, router::RegistryState};

/// GET /superheroes
pub async fn list_superheroes(
    State(state): State<RegistryState>,
    ListParams(query): ListParams,
) -> Result<Json<Vec<SuperheroView>>, RegistryError> {
    Ok(Json(state.service.list(query).await?))
}

/// GET /superheroes/{id}
pub async fn get_superhero(
    State(state): State<RegistryState>,
    IdParam(id): IdParam,
) -> Result<Json<SuperheroView>, RegistryError> {
    Ok(Json(state.service.get(id).await?))
}

/// POST /superheroes (multipart)
pub async fn create_superhero(
    State(state): State<RegistryState>,
    HeroForm(submission): HeroForm,
) -> Result<(StatusCode, Json<CreatedResponse>), RegistryError> {
    let id = state.service.create(submission).await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

/// PUT /superheroes/{id} (multipart, with `existingImages` keep list)
pub async fn update_superhero(
    State(state): State<RegistryState>,
    IdParam(id): IdParam,
    HeroForm(submission): HeroForm,
) -> Result<Json<MessageResponse>, RegistryError> {
    state.service.update(id, submission).await?;
    Ok(Json(MessageResponse::new("Superhero updated")))
}

/// DELETE /superheroes/{id}
pub async fn delete_superhero(
    State(state): State<RegistryState>,
    IdParam(id): IdParam,
) -> Result<Json<MessageResponse>, RegistryError> {
    state.service.delete(id).await?;
    Ok(Json(MessageResponse::new("Superhero deleted")))
}

/// GET /images/{id} -> raw bytes of a blob-stored image.
pub async fn get_image(
    State(state): State<RegistryState>,
    IdParam(id): IdParam,
) -> Result<Response, RegistryError> {
    let blob = state.service.image_blob(id).await?;
    let content_type = blob
        .content_type
        .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());
    Ok(([(header::CONTENT_TYPE, content_type)], blob.image_data).into_response())
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
