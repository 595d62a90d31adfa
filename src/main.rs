//! Audio extraction service
//!
//! An HTTP service that extracts the audio track from video or audio files
//! using the system ffmpeg tools, trying a lossless stream copy before
//! falling back to a bitrate re-encode, and optionally uploads the result
//! to an S3-compatible bucket (Cloudflare R2 style).

mod config;
mod config_file;
mod error;
mod http;
mod integration;
mod media;
mod pipeline;
mod state;
mod storage;
mod types;

use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ServerConfig;
use crate::error::{ExtractError, Result};
use crate::http::create_router;
use crate::state::AppState;
use crate::storage::CredentialDefaults;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
const APP_NAME: &str = "audio-extract";

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first so the logging section can configure the
    // subscriber; any load problem is reported right after init
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());
    let (config, load_warning) = if std::path::Path::new(&config_path).exists() {
        match crate::config_file::ConfigFile::from_file(&config_path) {
            Ok(cf) => (cf.into_server_config(), None),
            Err(e) => (
                ServerConfig::default(),
                Some(format!(
                    "Failed to load config file {}: {}. Using defaults.",
                    config_path, e
                )),
            ),
        }
    } else {
        (ServerConfig::default(), None)
    };

    init_logging(&config);

    tracing::info!("{} v{} starting", APP_NAME, VERSION);
    if let Some(warning) = load_warning {
        tracing::warn!("{}", warning);
    }
    tracing::info!("Configuration loaded: {:?}", config);

    match media::converter_version(&config.conversion).await {
        Some(version) => tracing::info!("FFmpeg version: {}", version),
        None => tracing::warn!(
            "FFmpeg not found at '{}'; conversion requests will fail",
            config.conversion.ffmpeg_path
        ),
    }

    // Snapshot storage credentials once; handlers never touch the environment
    let storage_defaults = CredentialDefaults::from_env();
    let state = Arc::new(AppState::new(config.clone(), storage_defaults));
    match &state.fixed_storage {
        Some(credentials) => tracing::info!(
            "Storage upload configured for bucket '{}'",
            credentials.bucket_name
        ),
        None => tracing::warn!(
            "Storage credentials not fully configured; /convert requires R2_ACCOUNT_ID, \
             R2_ACCESS_KEY_ID, R2_SECRET_ACCESS_KEY and R2_BUCKET_NAME"
        ),
    }

    // Build router
    let app = create_router(state.clone());

    // Start server
    let addr: SocketAddr = config.socket_addr().parse().map_err(|e| {
        ExtractError::Config(format!("invalid listen address {}: {}", config.socket_addr(), e))
    })?;
    tracing::info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Initialize logging with tracing
fn init_logging(config: &ServerConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "audio_extract={},tower_http=debug",
            config.log_level
        ))
    });
    let registry = tracing_subscriber::registry().with(filter);
    if config.log_format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
