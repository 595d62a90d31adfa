//! Configuration file support
//!
//! Loads server configuration from TOML files.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::{ConversionConfig, ServerConfig, StorageConfig};

/// Configuration file format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Server settings
    pub server: ServerSettings,
    /// Conversion tool settings
    pub conversion: Option<ConversionSettings>,
    /// Object storage settings
    pub storage: Option<StorageSettings>,
    /// Logging settings
    pub logging: Option<LoggingSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Host address to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Enable CORS
    pub cors_enabled: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionSettings {
    /// Path or name of the ffmpeg binary
    pub ffmpeg_path: Option<String>,
    /// Path or name of the ffprobe binary
    pub ffprobe_path: Option<String>,
    /// Directory for output artifacts (defaults to the system temp dir)
    pub work_dir: Option<PathBuf>,
    /// Wall-clock limit per tool invocation in seconds (unset: no limit)
    pub tool_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Storage service domain
    pub domain: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Output format (json, pretty)
    pub format: Option<String>,
}

impl ConfigFile {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: ConfigFile = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }

    /// Generate default configuration file
    pub fn default_config() -> Self {
        Self {
            server: ServerSettings {
                host: "0.0.0.0".to_string(),
                port: 3000,
                cors_enabled: Some(true),
            },
            conversion: Some(ConversionSettings {
                ffmpeg_path: Some("ffmpeg".to_string()),
                ffprobe_path: Some("ffprobe".to_string()),
                work_dir: None,
                tool_timeout_secs: None,
            }),
            storage: Some(StorageSettings {
                domain: Some("r2.cloudflarestorage.com".to_string()),
            }),
            logging: Some(LoggingSettings {
                level: "info".to_string(),
                format: Some("pretty".to_string()),
            }),
        }
    }

    /// Convert to ServerConfig
    pub fn into_server_config(self) -> ServerConfig {
        let defaults = ServerConfig::default();
        let conversion = self.conversion.unwrap_or(ConversionSettings {
            ffmpeg_path: None,
            ffprobe_path: None,
            work_dir: None,
            tool_timeout_secs: None,
        });
        ServerConfig {
            host: self.server.host,
            port: self.server.port,
            conversion: ConversionConfig {
                ffmpeg_path: conversion
                    .ffmpeg_path
                    .unwrap_or(defaults.conversion.ffmpeg_path),
                ffprobe_path: conversion
                    .ffprobe_path
                    .unwrap_or(defaults.conversion.ffprobe_path),
                work_dir: conversion.work_dir.unwrap_or(defaults.conversion.work_dir),
                tool_timeout_secs: conversion.tool_timeout_secs,
            },
            storage: StorageConfig {
                domain: self
                    .storage
                    .and_then(|s| s.domain)
                    .unwrap_or(defaults.storage.domain),
            },
            cors_enabled: self.server.cors_enabled.unwrap_or(true),
            log_level: self
                .logging
                .as_ref()
                .map(|l| l.level.clone())
                .unwrap_or_else(|| "info".to_string()),
            log_format: self
                .logging
                .and_then(|l| l.format)
                .unwrap_or_else(|| "pretty".to_string()),
        }
    }
}

/// Generate default configuration file at the specified path
pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<(), Box<dyn std::error::Error>> {
    let config = ConfigFile::default_config();
    config.to_file(path)?;
    Ok(())
}
