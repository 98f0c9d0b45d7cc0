use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {var}: {value}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub collections: CollectionNames,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub uri: String,
    pub name: String,
    pub connect_timeout_secs: u64,
    pub operation_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    /// Base URL used to build public download links for uploaded photos
    pub public_base_url: String,
    pub upload_dir: String,
    pub max_request_size_bytes: usize,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// HS256 signing secret. May be empty; token operations then fail.
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
    pub bcrypt_cost: u32,
}

/// Collections the application needs; created at startup when missing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionNames {
    pub categories: String,
    pub products: String,
    pub product_photos: String,
    pub users: String,
}

impl Default for CollectionNames {
    fn default() -> Self {
        Self {
            categories: "categorias".to_string(),
            products: "productos".to_string(),
            product_photos: "productos_fotos".to_string(),
            users: "usuarios".to_string(),
        }
    }
}

impl CollectionNames {
    pub fn required(&self) -> Vec<&str> {
        vec![
            self.categories.as_str(),
            self.products.as_str(),
            self.product_photos.as_str(),
            self.users.as_str(),
        ]
    }
}

impl DatabaseConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup (environment, map, ...)
    pub fn from_source<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = match lookup("APP_ENV").as_deref() {
            Some("production") | Some("prod") => Environment::Production,
            Some("staging") | Some("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        let config = match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_overrides(&lookup)?;

        config.validate()?;
        Ok(config)
    }

    fn with_overrides<F>(mut self, lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Database
        if let Some(v) = lookup("MONGODB_URI") {
            self.database.uri = v.trim().to_string();
        }
        if let Some(v) = lookup("DB_NAME") {
            self.database.name = v.trim().to_string();
        }
        if let Some(v) = lookup("DATABASE_CONNECT_TIMEOUT_SECS") {
            self.database.connect_timeout_secs = parse("DATABASE_CONNECT_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = lookup("DATABASE_OPERATION_TIMEOUT_SECS") {
            self.database.operation_timeout_secs = parse("DATABASE_OPERATION_TIMEOUT_SECS", &v)?;
        }

        // API
        let port_overridden = lookup("PORT").is_some();
        if let Some(v) = lookup("PORT") {
            self.api.port = parse("PORT", &v)?;
        }
        match lookup("PUBLIC_BASE_URL") {
            Some(v) => self.api.public_base_url = v.trim_end_matches('/').to_string(),
            None if port_overridden => {
                self.api.public_base_url = local_base_url(self.api.port)
            }
            None => {}
        }
        if let Some(v) = lookup("UPLOAD_DIR") {
            self.api.upload_dir = v;
        }
        if let Some(v) = lookup("MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = parse("MAX_REQUEST_SIZE_BYTES", &v)?;
        }
        if let Some(v) = lookup("CORS_ORIGINS") {
            self.api.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        // Security
        if let Some(v) = lookup("SECRET_JWT") {
            self.security.jwt_secret = v;
        }
        if let Some(v) = lookup("JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = parse("JWT_EXPIRY_HOURS", &v)?;
        }
        if let Some(v) = lookup("BCRYPT_COST") {
            self.security.bcrypt_cost = parse("BCRYPT_COST", &v)?;
        }

        Ok(self)
    }

    /// Change the listening port. A base URL still derived from the old port follows it;
    /// an explicit `PUBLIC_BASE_URL` is left alone.
    pub fn set_port(&mut self, port: u16) {
        if self.api.public_base_url == local_base_url(self.api.port) {
            self.api.public_base_url = local_base_url(port);
        }
        self.api.port = port;
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.uri.is_empty() {
            return Err(ConfigError::Missing("MONGODB_URI"));
        }
        if self.database.name.is_empty() {
            return Err(ConfigError::Missing("DB_NAME"));
        }
        if !(1..=MAX_JWT_EXPIRY_HOURS).contains(&self.security.jwt_expiry_hours) {
            return Err(ConfigError::Invalid {
                var: "JWT_EXPIRY_HOURS",
                value: self.security.jwt_expiry_hours.to_string(),
            });
        }
        if !(4..=31).contains(&self.security.bcrypt_cost) {
            return Err(ConfigError::Invalid {
                var: "BCRYPT_COST",
                value: self.security.bcrypt_cost.to_string(),
            });
        }
        Ok(())
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                uri: String::new(),
                name: String::new(),
                connect_timeout_secs: 10,
                operation_timeout_secs: 30,
            },
            api: ApiConfig {
                port: 8086,
                public_base_url: "http://localhost:8086".to_string(),
                upload_dir: "public/uploads/productos".to_string(),
                max_request_size_bytes: 5 * 1024 * 1024, // 5MB
                cors_origins: vec!["http://localhost:8086".to_string()],
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                bcrypt_cost: 8,
            },
            collections: CollectionNames::default(),
        }
    }

    fn staging() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Staging;
        config.database.operation_timeout_secs = 15;
        config.security.bcrypt_cost = 10;
        config
    }

    fn production() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Production;
        config.database.connect_timeout_secs = 5;
        config.database.operation_timeout_secs = 10;
        config.api.cors_origins = vec![];
        config.security.bcrypt_cost = 12;
        config
    }
}

fn local_base_url(port: u16) -> String {
    format!("http://localhost:{}", port)
}

/// Tokens may live at most one year
pub const MAX_JWT_EXPIRY_HOURS: i64 = 24 * 366;

fn parse<T: std::str::FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        var,
        value: value.to_string(),
    })
}
