//! HTTP request handlers
//!
//! Implements the two conversion endpoints (fixed-credential and
//! request-scoped storage) plus health, version, and debug endpoints.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::ExtractError;
use crate::pipeline::{self, ConvertRequest, UploadPlan};
use crate::state::AppState;
use crate::storage::CredentialOverrides;
use crate::types::AudioFormat;

/// HTTP error type
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Internal(String),
    UploadFailed(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            ApiError::UploadFailed(msg) => (StatusCode::BAD_GATEWAY, msg),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<ExtractError> for ApiError {
    fn from(err: ExtractError) -> Self {
        match err {
            // the client sent something we cannot work with
            ExtractError::ProbeFailure(_)
            | ExtractError::NoAudioStream
            | ExtractError::MissingCredentials(_) => ApiError::BadRequest(err.to_string()),
            // the storage service rejected or dropped the upload
            ExtractError::UploadFailure(_) => ApiError::UploadFailed(err.to_string()),
            ExtractError::ConversionFailure(_)
            | ExtractError::Config(_)
            | ExtractError::Io(_) => ApiError::Internal(err.to_string()),
        }
    }
}

/// Request body for the fixed-credential endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ConvertParams {
    /// Path to a locally available input file
    pub input_file: PathBuf,
    /// Output audio format
    #[serde(default)]
    pub format: AudioFormat,
    /// Audio bitrate for the re-encode fallback (e.g. 192k, 256k, 320k)
    #[serde(default = "default_bitrate")]
    pub bitrate: String,
}

/// Request body for the request-scoped storage endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ConvertCustomStorageParams {
    /// Path to a locally available input file
    pub input_file: PathBuf,
    /// Output audio format
    #[serde(default)]
    pub format: AudioFormat,
    /// Audio bitrate for the re-encode fallback (e.g. 192k, 256k, 320k)
    #[serde(default = "default_bitrate")]
    pub bitrate: String,
    /// Upload the artifact (default) or return its local path
    #[serde(default = "default_true")]
    pub upload_to_storage: bool,
    /// Credential fields; anything omitted (or empty) falls back to the
    /// environment snapshot taken at startup
    pub account_id: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub bucket_name: Option<String>,
}

fn default_bitrate() -> String {
    "192k".to_string()
}

fn default_true() -> bool {
    true
}

/// Response body for both conversion endpoints
#[derive(Debug, Serialize)]
pub struct ConvertResponse {
    /// Public object URL, or the local artifact path when uploading was
    /// skipped
    pub result: String,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "OK"
}

/// Version endpoint
pub async fn version_check() -> &'static str {
    concat!("audio-extract v", env!("CARGO_PKG_VERSION"))
}

/// Debug endpoint - running configuration (credentials never live in
/// `ServerConfig`, so nothing sensitive is exposed here)
pub async fn debug_config(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "config": state.config,
        "storage_configured": state.fixed_storage.is_some(),
    }))
}

/// Fixed-credential conversion endpoint
/// POST /convert
pub async fn convert(
    State(state): State<Arc<AppState>>,
    Json(params): Json<ConvertParams>,
) -> Result<Json<ConvertResponse>, ApiError> {
    let credentials = state.fixed_storage.clone().ok_or_else(|| {
        ApiError::Internal(
            "storage credentials not configured; set R2_ACCOUNT_ID, R2_ACCESS_KEY_ID, \
             R2_SECRET_ACCESS_KEY and R2_BUCKET_NAME"
                .to_string(),
        )
    })?;

    let request = ConvertRequest {
        input_file: params.input_file,
        format: params.format,
        bitrate: params.bitrate,
        upload: UploadPlan::Fixed(credentials),
    };
    let outcome = pipeline::convert(request, &state.config).await?;
    Ok(Json(ConvertResponse {
        result: outcome.result_string(),
    }))
}

/// Request-scoped storage conversion endpoint
/// POST /convert/custom-storage
pub async fn convert_custom_storage(
    State(state): State<Arc<AppState>>,
    Json(params): Json<ConvertCustomStorageParams>,
) -> Result<Json<ConvertResponse>, ApiError> {
    let upload = if params.upload_to_storage {
        UploadPlan::Resolve {
            overrides: CredentialOverrides {
                account_id: params.account_id,
                access_key: params.access_key,
                secret_key: params.secret_key,
                bucket_name: params.bucket_name,
            },
            defaults: state.storage_defaults.clone(),
        }
    } else {
        UploadPlan::Skip
    };

    let request = ConvertRequest {
        input_file: params.input_file,
        format: params.format,
        bitrate: params.bitrate,
        upload,
    };
    let outcome = pipeline::convert(request, &state.config).await?;
    Ok(Json(ConvertResponse {
        result: outcome.result_string(),
    }))
}
