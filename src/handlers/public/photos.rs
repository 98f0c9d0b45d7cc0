// handlers/public/photos.rs - /productos-fotos/:id handlers (no authentication)

use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::extract::{Path, State};
use mongodb::bson::doc;

use crate::api::{document_to_json, documents_to_json};
use crate::database::models::{encode, ProductPhoto};
use crate::database::store::id_filter;
use crate::database::{parse_object_id, Pipeline};
use crate::error::ApiError;
use crate::handlers::utils::decode;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// Multipart field carrying the image
const FILE_FIELD: &str = "file";

/// GET /productos-fotos/:id - photos of a product, with download URLs
pub async fn list(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let product_id = parse_object_id(&id)?;
    let url_prefix = format!("{}/imagenes/", state.config.api.public_base_url);

    let pipeline = Pipeline::new()
        .matching(doc! { "producto_id": product_id })
        .exclude(["timestamp", "producto_id"])
        .concat("nombre", url_prefix, "nombre");

    let documents = state
        .store
        .aggregate(state.database(), &state.collections().product_photos, &pipeline)
        .await?;

    Ok(ApiResponse::ok("Imágenes encontradas", documents_to_json(&documents)).with_field("producto_id", id))
}

/**
 * POST /productos-fotos/:id - upload one photo for a product
 *
 * Expects multipart form data with the image in the `file` field. The file is
 * written under a generated `<unix-seconds>.<ext>` name, then its metadata is
 * recorded. The product id is not checked for existence.
 */
pub async fn upload(
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult {
    let product_id = parse_object_id(&id)?;
    let mut multipart = multipart?;

    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(FILE_FIELD) {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let bytes = field.bytes().await?;
            upload = Some((file_name, bytes));
            break;
        }
    }
    let (file_name, bytes) =
        upload.ok_or_else(|| ApiError::bad_request("No se encontró el archivo"))?;

    let stored_name = state.storage.store(&file_name, &bytes).await?;

    let mut photo = ProductPhoto::new(stored_name, product_id);
    let inserted = match encode(&photo) {
        Ok(document) => {
            state
                .store
                .insert(state.database(), &state.collections().product_photos, document)
                .await
        }
        Err(e) => Err(e),
    };

    let id = match inserted {
        Ok(id) => id,
        Err(e) => {
            // Nothing references the file now; remove it
            if let Err(cleanup) = state.storage.delete(&photo.name).await {
                tracing::warn!("Orphaned upload {} left on disk: {}", photo.name, cleanup);
            }
            return Err(e.into());
        }
    };
    photo.id = Some(id);

    Ok(
        ApiResponse::created("Foto cargada y registrada correctamente", document_to_json(&encode(&photo)?))
            .with_field("estado", "ok"),
    )
}

/// DELETE /productos-fotos/:id - remove the file, then its record.
///
/// If the file cannot be removed the record stays in place.
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let object_id = parse_object_id(&id)?;
    let collection = &state.collections().product_photos;

    let mut found = state
        .store
        .find_existing(state.database(), collection, id_filter(object_id))
        .await?;
    if found.is_empty() {
        return Err(ApiError::not_found("Elemento no encontrado"));
    }
    let photo: ProductPhoto = decode(found.swap_remove(0))?;

    state.storage.delete(&photo.name).await?;

    let deleted = state.store.delete(state.database(), collection, &id).await?;

    Ok(ApiResponse::message("Imagen eliminada correctamente")
        .with_field("eliminado", deleted > 0)
        .with_field("id", id))
}
