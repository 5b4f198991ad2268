mod audio;
mod config;
mod error;
mod handlers;
mod llm;
mod notion;
mod routes;
mod speech;
mod state;

use anyhow::Result;
use axum::Router;
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "koememo_backend=debug,tower_http=info".to_string()),
        )
        .init();

    // Load configuration - explicit path first, then the usual names
    let config_paths: Vec<String> = vec![
        std::env::var("CONFIG_PATH").ok(),
        Some("conf.yaml".to_string()),
        Some("conf.json".to_string()),
    ]
    .into_iter()
    .flatten()
    .collect();

    let config_paths_clone = config_paths.clone();
    let mut config = None;
    let mut loaded_path = String::new();

    for path in config_paths {
        match Config::load(&path) {
            Ok(cfg) => {
                config = Some(cfg);
                loaded_path = path;
                break;
            }
            Err(e) => {
                tracing::debug!("Failed to load config from {}: {}", path, e);
                continue;
            }
        }
    }

    let config = config.ok_or_else(|| {
        anyhow::anyhow!("Could not find config file. Tried: {:?}", config_paths_clone)
    })?;

    info!("Loaded configuration from: {}", loaded_path);
    config.validate()?;

    // Initialize app state
    let app_state = AppState::new(config.clone());

    // Build application
    let app = Router::new()
        .merge(routes::create_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.system.port));
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
