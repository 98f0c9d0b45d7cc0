// handlers/public/categories.rs - /categorias CRUD handlers (no authentication)

use axum::extract::{rejection::JsonRejection, Path, State};
use axum::Json;
use mongodb::bson::doc;

use crate::api::{document_to_json, documents_to_json};
use crate::database::models::{encode, Category, CategoryInput};
use crate::database::store::id_filter;
use crate::database::{parse_object_id, Pipeline};
use crate::error::ApiError;
use crate::handlers::utils::{first_json, json_body};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

const NAME_REQUIRED: &str = "Nombre es un campo obligatorio";

/// GET /categorias - every category, newest first
pub async fn list(State(state): State<AppState>) -> ApiResult {
    let pipeline = Pipeline::new().matching(doc! {}).sort_desc("_id");
    let documents = state
        .store
        .aggregate(state.database(), &state.collections().categories, &pipeline)
        .await?;

    Ok(ApiResponse::ok(
        "Categorías listadas correctamente",
        documents_to_json(&documents),
    ))
}

/// GET /categorias/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let object_id = parse_object_id(&id)?;
    let pipeline = Pipeline::new().matching(id_filter(object_id));
    let documents = state
        .store
        .find_by_id_pipeline(state.database(), &state.collections().categories, &pipeline)
        .await?;

    Ok(ApiResponse::ok("Categoria encontrada", first_json(documents)?))
}

/**
 * POST /categorias - create a category
 *
 * Input: `{"nombre": "Frutas"}`. The slug and timestamp are derived server-side;
 * the created document is returned with its assigned `_id`.
 */
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<CategoryInput>, JsonRejection>,
) -> ApiResult {
    let input = json_body(payload)?;
    if !input.has_name() {
        return Err(ApiError::bad_request(NAME_REQUIRED));
    }

    let mut category = Category::new(&input.nombre);
    let id = state
        .store
        .insert(state.database(), &state.collections().categories, encode(&category)?)
        .await?;
    category.id = Some(id);

    Ok(ApiResponse::created(
        "Categoria creada correctamente",
        document_to_json(&encode(&category)?),
    ))
}

/// PUT /categorias/:id - rename; the slug follows the name
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<CategoryInput>, JsonRejection>,
) -> ApiResult {
    parse_object_id(&id)?;
    let input = json_body(payload)?;
    if !input.has_name() {
        return Err(ApiError::bad_request(NAME_REQUIRED));
    }

    let matched = state
        .store
        .update_partial(
            state.database(),
            &state.collections().categories,
            &id,
            input.to_patch(),
        )
        .await?;

    Ok(ApiResponse::message("Categoria actualizada correctamente").with_field("modificado", matched > 0))
}

/// DELETE /categorias/:id
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let deleted = state
        .store
        .delete(state.database(), &state.collections().categories, &id)
        .await?;

    Ok(ApiResponse::message("Categoria eliminada correctamente")
        .with_field("eliminado", deleted > 0)
        .with_field("id", id))
}
