use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SecurityConfig;

/// Value of the `generado_desde` claim on every token this service issues
pub const TOKEN_ISSUER: &str = "catalogo-api";

/// Identity carried by a bearer token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "correo")]
    pub email: String,
    #[serde(rename = "nombre")]
    pub name: String,
    /// Hex identifier of the user document
    pub id: String,
    #[serde(rename = "generado_desde")]
    pub generated_from: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("JWT secret not configured")]
    SecretNotConfigured,

    #[error("JWT generation error: {0}")]
    Signing(String),

    #[error("Password hashing error: {0}")]
    Hashing(String),

    /// Deliberately opaque: callers never learn which check failed
    #[error("Invalid token")]
    InvalidToken,
}

/// Password hashing and bearer-token issuance/validation.
///
/// Built once from configuration; holds no ambient state.
#[derive(Clone)]
pub struct CredentialService {
    secret: String,
    /// None when the configured lifetime does not fit in a `Duration`
    expiry: Option<Duration>,
    bcrypt_cost: u32,
}

impl std::fmt::Debug for CredentialService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialService")
            .field("secret", &"<redacted>")
            .field("expiry", &self.expiry)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish()
    }
}

impl CredentialService {
    pub fn new(config: &SecurityConfig) -> Self {
        Self {
            secret: config.jwt_secret.clone(),
            expiry: Duration::try_hours(config.jwt_expiry_hours),
            bcrypt_cost: config.bcrypt_cost,
        }
    }

    pub fn has_secret(&self) -> bool {
        !self.secret.is_empty()
    }

    /// Salted bcrypt hash; two calls on the same input never return the same string.
    ///
    /// Runs on the blocking pool.
    pub async fn hash_password(&self, plaintext: &str) -> Result<String, AuthError> {
        let plaintext = plaintext.to_string();
        let cost = self.bcrypt_cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(plaintext, cost))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))?
            .map_err(|e| AuthError::Hashing(e.to_string()))
    }

    /// False on mismatch and on malformed hashes alike
    pub async fn verify_password(&self, plaintext: &str, hash: &str) -> bool {
        let plaintext = plaintext.to_string();
        let hash = hash.to_string();
        tokio::task::spawn_blocking(move || bcrypt::verify(plaintext, &hash).unwrap_or(false))
            .await
            .unwrap_or(false)
    }

    pub fn issue_token(&self, email: &str, name: &str, id: &str) -> Result<String, AuthError> {
        self.issue_token_at(email, name, id, Utc::now())
    }

    pub(crate) fn issue_token_at(
        &self,
        email: &str,
        name: &str,
        id: &str,
        now: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        if !self.has_secret() {
            return Err(AuthError::SecretNotConfigured);
        }

        let expires_at = self
            .expiry
            .and_then(|expiry| now.checked_add_signed(expiry))
            .ok_or_else(|| AuthError::Signing("token expiry out of range".to_string()))?;

        let claims = Claims {
            email: email.to_string(),
            name: name.to_string(),
            id: id.to_string(),
            generated_from: TOKEN_ISSUER.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AuthError::Signing(e.to_string()))
    }

    /// Check signature, algorithm (HS256 only) and expiry, with no leeway.
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        if !self.has_secret() {
            return Err(AuthError::SecretNotConfigured);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::debug!("Token rejected: {}", e);
            AuthError::InvalidToken
        })
    }
}
