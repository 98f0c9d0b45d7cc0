use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::{json, Map, Value};

/// Success envelope: `{"mensaje": ..., "datos": ...}` plus any extra top-level fields
#[derive(Debug)]
pub struct ApiResponse<T: Serialize = Value> {
    pub mensaje: String,
    pub datos: Option<T>,
    pub extra: Map<String, Value>,
    pub status_code: StatusCode,
}

impl<T: Serialize> ApiResponse<T> {
    /// 200 OK with data
    pub fn ok(mensaje: impl Into<String>, datos: T) -> Self {
        Self {
            mensaje: mensaje.into(),
            datos: Some(datos),
            extra: Map::new(),
            status_code: StatusCode::OK,
        }
    }

    /// 201 Created with data
    pub fn created(mensaje: impl Into<String>, datos: T) -> Self {
        Self {
            status_code: StatusCode::CREATED,
            ..Self::ok(mensaje, datos)
        }
    }

    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.extra.insert(key.to_string(), value.into());
        self
    }
}

impl ApiResponse<Value> {
    /// Message-only response; details go in extra fields
    pub fn message(mensaje: impl Into<String>) -> Self {
        Self {
            mensaje: mensaje.into(),
            datos: None,
            extra: Map::new(),
            status_code: StatusCode::OK,
        }
    }

    pub fn with_status(mut self, status_code: StatusCode) -> Self {
        self.status_code = status_code;
        self
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let mut envelope = Map::new();
        envelope.insert("mensaje".to_string(), Value::String(self.mensaje));

        if let Some(datos) = self.datos {
            match serde_json::to_value(&datos) {
                Ok(value) => {
                    envelope.insert("datos".to_string(), value);
                }
                Err(e) => {
                    tracing::error!("Failed to serialize response data: {}", e);
                    return (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(json!({ "error": "Error al serializar la respuesta" })),
                    )
                        .into_response();
                }
            }
        }

        for (key, value) in self.extra {
            envelope.insert(key, value);
        }

        (self.status_code, Json(Value::Object(envelope))).into_response()
    }
}

pub type ApiResult<T = Value> = Result<ApiResponse<T>, crate::error::ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_of(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn envelope_carries_message_data_and_extras() {
        let response = ApiResponse::ok("Producto encontrado", json!({ "nombre": "Manzana" }))
            .with_field("usuario", "Hola Ana")
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_of(response).await,
            json!({
                "mensaje": "Producto encontrado",
                "datos": { "nombre": "Manzana" },
                "usuario": "Hola Ana"
            })
        );
    }

    #[tokio::test]
    async fn message_only_response_omits_data() {
        let response = ApiResponse::message("Usuario creado correctamente")
            .with_field("estado", "ok")
            .with_status(StatusCode::CREATED)
            .into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            body_of(response).await,
            json!({ "mensaje": "Usuario creado correctamente", "estado": "ok" })
        );
    }
}
