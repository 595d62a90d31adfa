//! Server configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// External tool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionConfig {
    /// Path or name of the ffmpeg binary
    pub ffmpeg_path: String,

    /// Path or name of the ffprobe binary
    pub ffprobe_path: String,

    /// Directory where output artifacts are written before upload
    pub work_dir: PathBuf,

    /// Optional wall-clock limit for a single tool invocation, in seconds.
    /// Unset means no limit; behavior is then identical to the untimed path.
    pub tool_timeout_secs: Option<u64>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
            work_dir: std::env::temp_dir(),
            tool_timeout_secs: None,
        }
    }
}

impl ConversionConfig {
    /// Tool timeout as a Duration, if configured
    pub fn tool_timeout(&self) -> Option<Duration> {
        self.tool_timeout_secs.map(Duration::from_secs)
    }
}

/// Object storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Storage service domain. Endpoint is `https://{account_id}.{domain}`,
    /// public object URLs are `https://{bucket}.{domain}/{key}`.
    pub domain: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            domain: "r2.cloudflarestorage.com".to_string(),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Conversion tool configuration
    pub conversion: ConversionConfig,

    /// Object storage configuration
    pub storage: StorageConfig,

    /// Enable CORS
    pub cors_enabled: bool,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Log output format (pretty, json)
    pub log_format: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            conversion: ConversionConfig::default(),
            storage: StorageConfig::default(),
            cors_enabled: true,
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
        }
    }
}

impl ServerConfig {
    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: ServerConfig = toml::from_str(&content)?;
        Ok(config)
    }
}
