// handlers/service.rs - GET / and GET /health

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use serde_json::{json, Value};

use crate::state::AppState;

pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "mensaje": "Catálogo API",
        "datos": {
            "name": env!("CARGO_PKG_NAME"),
            "version": version,
            "endpoints": {
                "categorias": "/api/v1/categorias[/:id] (public)",
                "productos": "/api/v1/productos[/:id] (bearer token)",
                "productos-fotos": "/api/v1/productos-fotos/:id (public)",
                "seguridad": "/api/v1/seguridad/registro, /api/v1/seguridad/login (public)",
                "imagenes": "/imagenes/:nombre (static)",
            }
        }
    }))
}

/// Liveness of the service and its database
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.ping(state.database()).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "mensaje": "ok",
                "datos": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "error": "database unavailable",
                    "datos": {
                        "status": "degraded",
                        "timestamp": now,
                    }
                })),
            )
        }
    }
}
