use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use catalogo_api::config::AppConfig;
use catalogo_api::database::{provision_collections, DocumentStore, MemoryStore, MongoStore};
use catalogo_api::storage::LocalStorage;
use catalogo_api::{app, AppState};

#[derive(Parser, Debug)]
#[command(name = "catalogo-api", version, about = "Product catalog REST API")]
struct Cli {
    /// Port to listen on (overrides PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Load environment variables from this file instead of ./.env
    #[arg(long, value_name = "FILE")]
    env_file: Option<PathBuf>,

    /// Serve from an in-process store instead of MongoDB (data is lost on exit)
    #[arg(long)]
    memory: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load .env if present so `cargo run` picks up MONGODB_URI, DB_NAME, SECRET_JWT, ...
    match &cli.env_file {
        Some(path) => {
            dotenvy::from_path(path)
                .with_context(|| format!("failed to load env file {}", path.display()))?;
        }
        None => {
            let _ = dotenvy::dotenv();
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info")),
        )
        .init();

    let mut config = AppConfig::from_env().context("invalid configuration")?;
    if let Some(port) = cli.port {
        config.set_port(port);
    }
    tracing::info!("Starting catalogo-api in {:?} mode", config.environment);
    if config.security.jwt_secret.is_empty() {
        tracing::warn!("SECRET_JWT is empty: login and product routes will fail until it is set");
    }

    let required = config.collections.required();
    let (store, mongo): (Arc<dyn DocumentStore>, Option<MongoStore>) = if cli.memory {
        tracing::warn!("Using the in-memory store; nothing will be persisted");
        let memory = MemoryStore::new();
        provision_collections(&memory, &config.database.name, &required).await?;
        (Arc::new(memory), None)
    } else {
        let mongo = MongoStore::connect(&config.database, &required)
            .await
            .context("failed to connect to MongoDB")?;
        (Arc::new(mongo.clone()), Some(mongo))
    };

    let storage = Arc::new(LocalStorage::new(&config.api.upload_dir));
    let port = config.api.port;
    let state = AppState::new(config, store, storage);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("catalogo-api listening on http://{}", bind_addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Some(mongo) = mongo {
        mongo.close().await;
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
