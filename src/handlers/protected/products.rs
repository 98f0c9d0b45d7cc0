// handlers/protected/products.rs - /productos CRUD handlers (bearer token required)

use axum::extract::{rejection::JsonRejection, Path, State};
use axum::{Extension, Json};
use mongodb::bson::{doc, Document};

use crate::api::{document_to_json, documents_to_json};
use crate::database::models::{encode, ProductInput, UpdateProductInput};
use crate::database::store::id_filter;
use crate::database::{parse_object_id, Pipeline};
use crate::error::ApiError;
use crate::handlers::utils::{first_json, json_body};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;
use crate::validation::Validate;

/// Match, then embed the category under `categoria` (empty when the reference dangles)
fn with_category(state: &AppState, filter: Document) -> Pipeline {
    Pipeline::new()
        .matching(filter)
        .lookup(&state.collections().categories, "categoria_id", "_id", "categoria")
        .exclude(["categoria_id"])
}

/// GET /productos - every product with its category, newest first
pub async fn list(State(state): State<AppState>) -> ApiResult {
    let pipeline = with_category(&state, doc! {}).sort_desc("_id");
    let documents = state
        .store
        .aggregate(state.database(), &state.collections().products, &pipeline)
        .await?;

    Ok(ApiResponse::ok(
        "Productos listados correctamente",
        documents_to_json(&documents),
    ))
}

/// GET /productos/:id - one product, plus who asked
pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult {
    let object_id = parse_object_id(&id)?;
    let pipeline = with_category(&state, id_filter(object_id));
    let documents = state
        .store
        .find_by_id_pipeline(state.database(), &state.collections().products, &pipeline)
        .await?;

    Ok(ApiResponse::ok("Producto encontrado", first_json(documents)?)
        .with_field("usuario", format!("Hola {}", user.name))
        .with_field("idUsuario", user.id))
}

/**
 * POST /productos - create a product
 *
 * Input:
 * ```json
 * {
 *   "nombre": "Manzana",               // 2..=100 characters
 *   "precio": 500,                     // > 0
 *   "stock": 10,                       // >= 0
 *   "descripcion": "Manzana roja...",  // at least 10 characters
 *   "categoria_id": "64b7f0c2..."      // 24 hex characters, stored as an identifier
 * }
 * ```
 */
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<ProductInput>, JsonRejection>,
) -> ApiResult {
    let input = json_body(payload)?;
    input.validate()?;

    let mut product = input.into_product()?;
    let id = state
        .store
        .insert(state.database(), &state.collections().products, encode(&product)?)
        .await?;
    product.id = Some(id);

    Ok(ApiResponse::created(
        "Producto creado correctamente",
        document_to_json(&encode(&product)?),
    ))
}

/// PUT /productos/:id - change only the fields present in the body
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateProductInput>, JsonRejection>,
) -> ApiResult {
    parse_object_id(&id)?;
    let input = json_body(payload)?;
    if input.is_empty() {
        return Err(ApiError::bad_request(
            "Debe proporcionar al menos un campo para actualizar",
        ));
    }
    input.validate()?;

    let matched = state
        .store
        .update_partial(
            state.database(),
            &state.collections().products,
            &id,
            input.to_patch()?,
        )
        .await?;

    Ok(ApiResponse::message("Producto actualizado correctamente").with_field("modificado", matched > 0))
}

/// DELETE /productos/:id
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let deleted = state
        .store
        .delete(state.database(), &state.collections().products, &id)
        .await?;

    Ok(ApiResponse::message("Producto eliminado correctamente")
        .with_field("eliminado", deleted > 0)
        .with_field("id", id))
}
