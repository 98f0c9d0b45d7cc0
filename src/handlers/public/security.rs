// handlers/public/security.rs - POST /seguridad/registro and POST /seguridad/login

use axum::extract::{rejection::JsonRejection, State};
use axum::{http::StatusCode, Json};
use mongodb::bson::doc;

use crate::database::models::{encode, LoginInput, LoginResponse, RegisterInput, User};
use crate::error::ApiError;
use crate::handlers::utils::{decode, json_body};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;
use crate::validation::Validate;

const INVALID_CREDENTIALS: &str = "Las credenciales ingresadas son inválidas";

/**
 * POST /seguridad/registro - create a user account
 *
 * Input: `{"nombre", "correo", "telefono", "password"}`. The e-mail must not be
 * registered yet; the check and the insert are separate store calls, so two
 * simultaneous registrations of one address can both succeed.
 */
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterInput>, JsonRejection>,
) -> ApiResult {
    let input = json_body(payload)?;
    input.validate()?;

    let users = &state.collections().users;
    let existing = state
        .store
        .find_existing(state.database(), users, doc! { "correo": input.correo.trim() })
        .await?;
    if !existing.is_empty() {
        return Err(ApiError::bad_request("El correo ya está registrado"));
    }

    let password_hash = state.credentials.hash_password(&input.password).await?;
    let user = input.into_user(password_hash);
    let id = state
        .store
        .insert(state.database(), users, encode(&user)?)
        .await?;

    tracing::info!("Registered user {}", id);
    Ok(ApiResponse::message("Usuario creado correctamente")
        .with_field("estado", "ok")
        .with_field("id", id.to_hex())
        .with_status(StatusCode::CREATED))
}

/**
 * POST /seguridad/login - exchange credentials for a bearer token
 *
 * Output: `{"nombre": "...", "token": "Bearer <jwt>"}`. Unknown e-mail and wrong
 * password produce the same message.
 */
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginInput>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let input = json_body(payload)?;
    input.validate()?;

    let mut found = state
        .store
        .find_existing(
            state.database(),
            &state.collections().users,
            doc! { "correo": input.correo.trim() },
        )
        .await?;
    if found.is_empty() {
        tracing::debug!("Login for unknown e-mail");
        return Err(ApiError::bad_request(INVALID_CREDENTIALS));
    }
    let user: User = decode(found.swap_remove(0))?;

    if !state
        .credentials
        .verify_password(&input.password, &user.password_hash)
        .await
    {
        tracing::debug!("Login with wrong password");
        return Err(ApiError::bad_request(INVALID_CREDENTIALS));
    }

    let id = user.id.map(|id| id.to_hex()).unwrap_or_default();
    let token = state.credentials.issue_token(&user.email, &user.name, &id)?;

    Ok(Json(LoginResponse {
        nombre: user.name,
        token: format!("Bearer {}", token),
    }))
}
