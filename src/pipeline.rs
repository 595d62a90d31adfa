//! Extraction pipeline
//!
//! Linear orchestration of one request: probe, convert, then either upload
//! the artifact or hand back its local path. Strictly sequential; the only
//! retry anywhere is the stream-copy to re-encode fallback inside the
//! extractor. The output artifact is held by an RAII guard so every exit
//! except the return-local-path outcome removes it from disk.

use chrono::Local;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::error::{ExtractError, Result};
use crate::media;
use crate::storage::{
    resolve_credentials, CredentialDefaults, CredentialOverrides, StorageClient,
    StorageCredentials,
};
use crate::types::AudioFormat;

/// Key prefix for uploaded objects
const OBJECT_KEY_PREFIX: &str = "audio_files";

/// What to do with the converted artifact
#[derive(Debug, Clone)]
pub enum UploadPlan {
    /// Upload with credentials fixed at startup
    Fixed(StorageCredentials),
    /// Merge per-request values over the environment snapshot, then upload
    Resolve {
        overrides: CredentialOverrides,
        defaults: CredentialDefaults,
    },
    /// Keep the artifact and return its local path
    Skip,
}

impl UploadPlan {
    /// Credentials for the upload stage, or None when the artifact stays
    /// local. For the request-scoped variant this is where the per-field
    /// merge and the all-or-nothing presence check run.
    fn into_credentials(self) -> Result<Option<StorageCredentials>> {
        match self {
            UploadPlan::Skip => Ok(None),
            UploadPlan::Fixed(credentials) => Ok(Some(credentials)),
            UploadPlan::Resolve {
                overrides,
                defaults,
            } => resolve_credentials(overrides, &defaults).map(Some),
        }
    }
}

/// One extraction job
#[derive(Debug, Clone)]
pub struct ConvertRequest {
    pub input_file: PathBuf,
    pub format: AudioFormat,
    pub bitrate: String,
    pub upload: UploadPlan,
}

/// Result of a completed job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConvertOutcome {
    Uploaded { url: String },
    LocalFile { path: PathBuf },
}

impl ConvertOutcome {
    /// The string handed back to the client: URL or local path
    pub fn result_string(&self) -> String {
        match self {
            ConvertOutcome::Uploaded { url } => url.clone(),
            ConvertOutcome::LocalFile { path } => path.display().to_string(),
        }
    }
}

/// Run one extraction job to completion.
pub async fn convert(request: ConvertRequest, config: &ServerConfig) -> Result<ConvertOutcome> {
    let job_id = Uuid::new_v4();
    tracing::info!(
        %job_id,
        input = %request.input_file.display(),
        format = %request.format,
        bitrate = %request.bitrate,
        "starting audio extraction"
    );

    // Probing: reject inputs without an audio stream before any conversion
    let report = media::probe_file(&request.input_file, &config.conversion).await?;
    if !report.has_audio() {
        return Err(ExtractError::NoAudioStream);
    }
    if let Some(stream) = report.first_audio() {
        tracing::debug!(
            %job_id,
            index = ?stream.index,
            codec = stream.codec_name.as_deref().unwrap_or("unknown"),
            streams = report.streams.len(),
            "audio stream found"
        );
    }

    // Converting
    let filename = output_filename(request.format);
    let output_path = config.conversion.work_dir.join(&filename);
    media::extract_audio(
        &request.input_file,
        &output_path,
        &request.bitrate,
        &config.conversion,
    )
    .await?;
    let artifact = ArtifactGuard::new(output_path);

    // Uploading or returning the local path; every other exit from here on
    // drops the guard and removes the file
    match request.upload.into_credentials()? {
        None => {
            let path = artifact.keep();
            tracing::info!(%job_id, path = %path.display(), "returning local artifact");
            Ok(ConvertOutcome::LocalFile { path })
        }
        Some(credentials) => {
            let client = StorageClient::new(&credentials, &config.storage.domain);
            let key = format!("{}/{}", OBJECT_KEY_PREFIX, filename);
            let url = client
                .put_file(artifact.path(), &key, request.format.content_type())
                .await?;
            tracing::info!(%job_id, %url, "artifact uploaded");
            Ok(ConvertOutcome::Uploaded { url })
        }
    }
}

/// Artifact name: `audio_{timestamp}.{ext}`, local time, second resolution.
/// The name doubles as the tail of the object key and public URL.
fn output_filename(format: AudioFormat) -> String {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    format!("audio_{}.{}", timestamp, format.extension())
}

/// Removes the artifact on drop unless explicitly kept
struct ArtifactGuard {
    path: PathBuf,
    keep: bool,
}

impl ArtifactGuard {
    fn new(path: PathBuf) -> Self {
        Self { path, keep: false }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    /// Disarm the guard and hand the path out as the result
    fn keep(mut self) -> PathBuf {
        self.keep = true;
        self.path.clone()
    }
}

impl Drop for ArtifactGuard {
    fn drop(&mut self) {
        if self.keep {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "removed local artifact"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to remove local artifact")
            }
        }
    }
}
