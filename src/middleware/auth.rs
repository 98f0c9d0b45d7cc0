use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::auth::Claims;
use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated caller, attached to request extensions by `require_bearer`
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.id,
            name: claims.name,
            email: claims.email,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum HeaderProblem {
    Missing,
    Malformed,
}

/// Bearer-token gate for protected routes.
///
/// Missing header or wrong shape is 401; an unconfigured secret is 500 since it is a
/// server fault; any token failure is an opaque 401.
pub async fn require_bearer(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = match parse_bearer(request.headers()) {
        Ok(token) => token.to_string(),
        Err(HeaderProblem::Missing) => {
            return Err(ApiError::unauthorized("Header 'Authorization' es requerido"))
        }
        Err(HeaderProblem::Malformed) => {
            return Err(ApiError::unauthorized("Formato de autorización inválido"))
        }
    };

    if !state.credentials.has_secret() {
        tracing::error!("Rejecting protected request: SECRET_JWT is not configured");
        return Err(ApiError::internal_server_error("Clave secreta no configurada"));
    }

    let claims = state.credentials.validate_token(&token).map_err(|e| {
        tracing::warn!("Rejected bearer token on {}", request.uri().path());
        ApiError::from(e)
    })?;

    request.extensions_mut().insert(AuthUser::from(claims));
    Ok(next.run(request).await)
}

/// Exactly two space-separated parts, scheme matched case-insensitively
fn parse_bearer(headers: &HeaderMap) -> Result<&str, HeaderProblem> {
    let value = headers.get(AUTHORIZATION).ok_or(HeaderProblem::Missing)?;
    let value = value.to_str().map_err(|_| HeaderProblem::Malformed)?;
    if value.is_empty() {
        return Err(HeaderProblem::Missing);
    }

    let parts: Vec<&str> = value.split(' ').collect();
    match parts.as_slice() {
        [scheme, token] if scheme.eq_ignore_ascii_case("bearer") => Ok(token.trim()),
        _ => Err(HeaderProblem::Malformed),
    }
}
