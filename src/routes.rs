use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::handlers::{protected, public, service};
use crate::middleware::require_bearer;
use crate::state::AppState;

pub const API_PREFIX: &str = "/api/v1";

/// Full application router
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .merge(category_routes())
        .merge(product_routes(state.clone()))
        .merge(photo_routes())
        .merge(security_routes());

    let api_config = &state.config.api;

    Router::new()
        .route("/", get(service::root))
        .route("/health", get(service::health))
        .nest(API_PREFIX, api)
        // Uploaded photos are served straight from disk
        .nest_service("/imagenes", ServeDir::new(&api_config.upload_dir))
        // Global middleware
        .layer(DefaultBodyLimit::max(api_config.max_request_size_bytes))
        .layer(cors_layer(&api_config.cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn category_routes() -> Router<AppState> {
    use public::categories;

    Router::new()
        .route("/categorias", get(categories::list).post(categories::create))
        .route(
            "/categorias/:id",
            get(categories::get)
                .put(categories::update)
                .delete(categories::delete),
        )
}

fn product_routes(state: AppState) -> Router<AppState> {
    use protected::products;

    Router::new()
        .route("/productos", get(products::list).post(products::create))
        .route(
            "/productos/:id",
            get(products::get)
                .put(products::update)
                .delete(products::delete),
        )
        .route_layer(from_fn_with_state(state, require_bearer))
}

fn photo_routes() -> Router<AppState> {
    use public::photos;

    Router::new().route(
        "/productos-fotos/:id",
        get(photos::list).post(photos::upload).delete(photos::delete),
    )
}

fn security_routes() -> Router<AppState> {
    use public::security;

    Router::new()
        .route("/seguridad/registro", post(security::register))
        .route("/seguridad/login", post(security::login))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            header::ORIGIN,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::AUTHORIZATION,
        ])
}
