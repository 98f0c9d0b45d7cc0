mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::{json, Value};

fn manzana(categoria_id: &str) -> Value {
    json!({
        "nombre": "Manzana",
        "precio": 500,
        "stock": 12,
        "descripcion": "Manzana roja de temporada",
        "categoria_id": categoria_id
    })
}

#[tokio::test]
async fn every_product_route_requires_a_token() -> Result<()> {
    let app = common::spawn_app().await?;
    let some_id = "/api/v1/productos/64b7f0c2a1b2c3d4e5f60718";

    let checks = [
        app.get("/api/v1/productos", None).await?,
        app.post("/api/v1/productos", json!({}), None).await?,
        app.get(some_id, None).await?,
        app.put(some_id, json!({ "stock": 1 }), None).await?,
        app.delete(some_id, None).await?,
    ];
    for (status, body) in checks {
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Header 'Authorization' es requerido");
    }
    Ok(())
}

#[tokio::test]
async fn created_product_is_listed_with_its_category() -> Result<()> {
    let app = common::spawn_app().await?;
    let token = app.login_as_ana().await?;
    let category_id = app.create_category("Frutas").await?;

    let (status, body) = app
        .post("/api/v1/productos", manzana(&category_id), Some(&token))
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["datos"]["categoria_id"], category_id.as_str());
    assert_eq!(body["datos"]["_id"].as_str().map(str::len), Some(24));

    let (status, body) = app.get("/api/v1/productos", Some(&token)).await?;
    assert_eq!(status, StatusCode::OK);
    let product = &body["datos"][0];
    assert_eq!(product["nombre"], "Manzana");
    assert!(product.get("categoria_id").is_none(), "raw reference is hidden");
    assert_eq!(product["categoria"][0]["_id"], category_id.as_str());
    assert_eq!(product["categoria"][0]["nombre"], "Frutas");
    Ok(())
}

#[tokio::test]
async fn dangling_category_yields_empty_join() -> Result<()> {
    let app = common::spawn_app().await?;
    let token = app.login_as_ana().await?;

    let (status, _) = app
        .post("/api/v1/productos", manzana("64b7f0c2a1b2c3d4e5f60718"), Some(&token))
        .await?;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = app.get("/api/v1/productos", Some(&token)).await?;
    assert_eq!(body["datos"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["datos"][0]["categoria"], json!([]));
    Ok(())
}

#[tokio::test]
async fn get_by_id_greets_the_caller() -> Result<()> {
    let app = common::spawn_app().await?;
    let token = app.login_as_ana().await?;
    let category_id = app.create_category("Frutas").await?;

    let (_, created) = app
        .post("/api/v1/productos", manzana(&category_id), Some(&token))
        .await?;
    let id = created["datos"]["_id"].as_str().unwrap_or_default().to_string();

    let (status, body) = app
        .get(&format!("/api/v1/productos/{}", id), Some(&token))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mensaje"], "Producto encontrado");
    assert_eq!(body["datos"]["_id"], id.as_str());
    assert_eq!(body["datos"]["categoria"][0]["nombre"], "Frutas");
    assert_eq!(body["usuario"], "Hola Ana");
    assert_eq!(body["idUsuario"].as_str().map(str::len), Some(24));

    let (status, _) = app
        .get("/api/v1/productos/64b7f0c2a1b2c3d4e5f60718", Some(&token))
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn create_rejects_invalid_fields() -> Result<()> {
    let app = common::spawn_app().await?;
    let token = app.login_as_ana().await?;

    let (status, body) = app
        .post(
            "/api/v1/productos",
            json!({
                "nombre": "M",
                "precio": 0,
                "stock": -1,
                "descripcion": "corta",
                "categoria_id": "123"
            }),
            Some(&token),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let campos = body["campos"].as_object().cloned().unwrap_or_default();
    for field in ["nombre", "precio", "stock", "descripcion", "categoria_id"] {
        assert!(campos.contains_key(field), "missing error for {}: {}", field, body);
    }
    assert_eq!(campos["precio"], "El campo 'precio' debe ser mayor que 0");
    Ok(())
}

#[tokio::test]
async fn update_applies_only_present_fields() -> Result<()> {
    let app = common::spawn_app().await?;
    let token = app.login_as_ana().await?;
    let category_id = app.create_category("Frutas").await?;

    let (_, created) = app
        .post("/api/v1/productos", manzana(&category_id), Some(&token))
        .await?;
    let uri = format!(
        "/api/v1/productos/{}",
        created["datos"]["_id"].as_str().unwrap_or_default()
    );

    let (status, body) = app.put(&uri, json!({}), Some(&token)).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Debe proporcionar al menos un campo para actualizar");

    let (status, body) = app
        .put(&uri, json!({ "stock": 0, "precio": 650 }), Some(&token))
        .await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["modificado"], true);

    let (_, body) = app.get(&uri, Some(&token)).await?;
    assert_eq!(body["datos"]["stock"], 0);
    assert_eq!(body["datos"]["precio"], 650);
    assert_eq!(body["datos"]["nombre"], "Manzana");
    assert_eq!(body["datos"]["descripcion"], "Manzana roja de temporada");

    let (status, _) = app.put(&uri, json!({ "precio": -3 }), Some(&token)).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn delete_then_not_found() -> Result<()> {
    let app = common::spawn_app().await?;
    let token = app.login_as_ana().await?;

    let (_, created) = app
        .post("/api/v1/productos", manzana("64b7f0c2a1b2c3d4e5f60718"), Some(&token))
        .await?;
    let uri = format!(
        "/api/v1/productos/{}",
        created["datos"]["_id"].as_str().unwrap_or_default()
    );

    let (status, body) = app.delete(&uri, Some(&token)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["eliminado"], true);

    let (status, body) = app.delete(&uri, Some(&token)).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Elemento no encontrado");
    Ok(())
}
