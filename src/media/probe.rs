//! Stream inspection via ffprobe
//!
//! Runs `ffprobe -v quiet -print_format json -show_streams` against an input
//! file and parses the stream listing. Only `codec_type` is consumed by the
//! pipeline; `index` and `codec_name` feed debug logging.

use serde::Deserialize;
use std::path::Path;
use tokio::process::Command;

use crate::config::ConversionConfig;
use crate::error::{ExtractError, Result};
use crate::media::run_with_timeout;

/// Parsed ffprobe output. Unknown fields are ignored; a document without a
/// `streams` key parses as an empty listing.
#[derive(Debug, Clone, Deserialize)]
pub struct ProbeReport {
    #[serde(default)]
    pub streams: Vec<StreamInfo>,
}

/// One entry of the ffprobe stream listing
#[derive(Debug, Clone, Deserialize)]
pub struct StreamInfo {
    pub index: Option<u32>,
    pub codec_type: Option<String>,
    pub codec_name: Option<String>,
}

impl ProbeReport {
    /// Whether any stream is of type "audio"
    pub fn has_audio(&self) -> bool {
        self.streams
            .iter()
            .any(|s| s.codec_type.as_deref() == Some("audio"))
    }

    /// First audio stream, for logging
    pub fn first_audio(&self) -> Option<&StreamInfo> {
        self.streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some("audio"))
    }
}

/// Probe an input file and return its parsed stream listing.
///
/// Spawn failures, non-zero exits, and unparseable output all map to
/// `ProbeFailure`; the audio-presence check is the caller's concern.
pub async fn probe_file(input: &Path, config: &ConversionConfig) -> Result<ProbeReport> {
    let mut command = Command::new(&config.ffprobe_path);
    command
        .arg("-v")
        .arg("quiet")
        .arg("-print_format")
        .arg("json")
        .arg("-show_streams")
        .arg(input);

    let output = run_with_timeout(command, config.tool_timeout(), &config.ffprobe_path)
        .await
        .map_err(ExtractError::ProbeFailure)?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let detail = if stderr.trim().is_empty() {
            // -v quiet suppresses most diagnostics; fall back to the exit status
            format!("ffprobe exited with {}", output.status)
        } else {
            stderr.trim().to_string()
        };
        return Err(ExtractError::ProbeFailure(detail));
    }

    parse_report(&output.stdout)
}

/// Parse raw ffprobe stdout into a report
pub fn parse_report(stdout: &[u8]) -> Result<ProbeReport> {
    serde_json::from_slice(stdout)
        .map_err(|e| ExtractError::ProbeFailure(format!("unparseable probe output: {}", e)))
}
