#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use axum::body::{to_bytes, Body, Bytes};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use catalogo_api::config::AppConfig;
use catalogo_api::database::{provision_collections, MemoryStore};
use catalogo_api::storage::LocalStorage;
use catalogo_api::{app, AppState};

pub const TEST_SECRET: &str = "test-secret";
pub const MULTIPART_BOUNDARY: &str = "catalogo-test-boundary";

/// Router over an in-memory store and a throwaway upload directory
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub upload_dir: PathBuf,
    _uploads: TempDir,
}

pub async fn spawn_app() -> Result<TestApp> {
    spawn_app_with_secret(TEST_SECRET).await
}

pub async fn spawn_app_with_secret(secret: &str) -> Result<TestApp> {
    let uploads = tempfile::tempdir()?;
    let upload_dir = uploads.path().join("productos");

    let upload_dir_str = upload_dir.display().to_string();
    let secret = secret.to_string();
    let config = AppConfig::from_source(move |key| match key {
        "MONGODB_URI" => Some("mongodb://unused:27017".to_string()),
        "DB_NAME" => Some("catalogo_test".to_string()),
        "SECRET_JWT" => Some(secret.clone()),
        "BCRYPT_COST" => Some("4".to_string()),
        "UPLOAD_DIR" => Some(upload_dir_str.clone()),
        _ => None,
    })?;

    let store = MemoryStore::new();
    provision_collections(&store, &config.database.name, &config.collections.required()).await?;

    let storage = LocalStorage::new(&upload_dir);
    let state = AppState::new(config, Arc::new(store), Arc::new(storage));

    Ok(TestApp {
        router: app(state.clone()),
        state,
        upload_dir,
        _uploads: uploads,
    })
}

impl TestApp {
    pub async fn send_raw(&self, request: Request<Body>) -> Result<(StatusCode, Bytes)> {
        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        Ok((status, bytes))
    }

    pub async fn send(&self, request: Request<Body>) -> Result<(StatusCode, Value)> {
        let (status, bytes) = self.send_raw(request).await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };
        Ok((status, body))
    }

    pub async fn get(&self, uri: &str, auth: Option<&str>) -> Result<(StatusCode, Value)> {
        self.send(request(Method::GET, uri, None, auth)?).await
    }

    pub async fn post(&self, uri: &str, body: Value, auth: Option<&str>) -> Result<(StatusCode, Value)> {
        self.send(request(Method::POST, uri, Some(body), auth)?).await
    }

    pub async fn put(&self, uri: &str, body: Value, auth: Option<&str>) -> Result<(StatusCode, Value)> {
        self.send(request(Method::PUT, uri, Some(body), auth)?).await
    }

    pub async fn delete(&self, uri: &str, auth: Option<&str>) -> Result<(StatusCode, Value)> {
        self.send(request(Method::DELETE, uri, None, auth)?).await
    }

    /// Register Ana and return the ready-to-use `Authorization` value from login
    pub async fn login_as_ana(&self) -> Result<String> {
        let (status, _) = self.post("/api/v1/seguridad/registro", ana(), None).await?;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = self
            .post(
                "/api/v1/seguridad/login",
                json!({ "correo": "ana@x.com", "password": "Abcdef1!" }),
                None,
            )
            .await?;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);

        Ok(body["token"].as_str().unwrap_or_default().to_string())
    }

    pub async fn create_category(&self, nombre: &str) -> Result<String> {
        let (status, body) = self
            .post("/api/v1/categorias", json!({ "nombre": nombre }), None)
            .await?;
        assert_eq!(status, StatusCode::CREATED, "category create failed: {}", body);
        Ok(body["datos"]["_id"].as_str().unwrap_or_default().to_string())
    }

    pub async fn upload_photo(
        &self,
        product_id: &str,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<(StatusCode, Value)> {
        let request = Request::builder()
            .method(Method::POST)
            .uri(format!("/api/v1/productos-fotos/{}", product_id))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", MULTIPART_BOUNDARY),
            )
            .body(Body::from(multipart_body("file", file_name, bytes)))?;
        self.send(request).await
    }
}

pub fn ana() -> Value {
    json!({
        "nombre": "Ana",
        "correo": "ana@x.com",
        "telefono": "123",
        "password": "Abcdef1!"
    })
}

pub fn request(
    method: Method,
    uri: &str,
    body: Option<Value>,
    auth: Option<&str>,
) -> Result<Request<Body>> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body)?))?,
        None => builder.body(Body::empty())?,
    };
    Ok(request)
}

pub fn multipart_body(field: &str, file_name: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", MULTIPART_BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, file_name
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", MULTIPART_BOUNDARY).as_bytes());
    body
}
