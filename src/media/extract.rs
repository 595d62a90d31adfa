//! Audio extraction via ffmpeg
//!
//! Strips the video stream and writes the audio to the requested output
//! path. Attempts are evaluated in a fixed order: a stream copy first
//! (near-instant and lossless when the codec fits the target container),
//! then a re-encode at the requested bitrate. Exactly two attempts, no
//! other combinations.

use std::fmt;
use std::path::Path;
use tokio::process::Command;

use crate::config::ConversionConfig;
use crate::error::{ExtractError, Result};
use crate::media::run_with_timeout;

/// One conversion attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecStrategy {
    /// Copy the encoded audio stream into the new container unchanged
    StreamCopy,
    /// Decode and re-compress the audio at the given bitrate
    Reencode { bitrate: String },
}

impl CodecStrategy {
    /// Ordered attempt plan for one extraction
    pub fn plan(bitrate: &str) -> Vec<CodecStrategy> {
        vec![
            CodecStrategy::StreamCopy,
            CodecStrategy::Reencode {
                bitrate: bitrate.to_string(),
            },
        ]
    }

    /// ffmpeg arguments placed between the input and `-y <output>`
    pub fn args(&self) -> Vec<&str> {
        match self {
            CodecStrategy::StreamCopy => vec!["-vn", "-acodec", "copy"],
            CodecStrategy::Reencode { bitrate } => vec!["-vn", "-b:a", bitrate],
        }
    }
}

impl fmt::Display for CodecStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecStrategy::StreamCopy => write!(f, "stream copy"),
            CodecStrategy::Reencode { bitrate } => write!(f, "re-encode at {}", bitrate),
        }
    }
}

/// Extract the audio track of `input` to `output`.
///
/// On failure of both attempts the partially written output file is removed
/// before `ConversionFailure` (carrying the last attempt's diagnostics)
/// propagates.
pub async fn extract_audio(
    input: &Path,
    output: &Path,
    bitrate: &str,
    config: &ConversionConfig,
) -> Result<()> {
    let mut last_failure = String::new();

    for strategy in CodecStrategy::plan(bitrate) {
        match run_converter(input, output, &strategy, config).await {
            Ok(()) => {
                tracing::debug!(%strategy, output = %output.display(), "conversion succeeded");
                return Ok(());
            }
            Err(detail) => {
                tracing::debug!(%strategy, %detail, "conversion attempt failed");
                last_failure = detail;
            }
        }
    }

    // Both attempts failed; do not leave a partial artifact behind
    if tokio::fs::try_exists(output).await.unwrap_or(false) {
        if let Err(e) = tokio::fs::remove_file(output).await {
            tracing::warn!(path = %output.display(), error = %e, "failed to remove partial output");
        }
    }

    Err(ExtractError::ConversionFailure(last_failure))
}

/// Run one ffmpeg attempt. Returns diagnostic text on any failure
/// (spawn error, timeout, or non-zero exit).
async fn run_converter(
    input: &Path,
    output: &Path,
    strategy: &CodecStrategy,
    config: &ConversionConfig,
) -> std::result::Result<(), String> {
    let mut command = Command::new(&config.ffmpeg_path);
    command.arg("-i").arg(input);
    command.args(strategy.args());
    command.arg("-y").arg(output);

    let result = run_with_timeout(command, config.tool_timeout(), &config.ffmpeg_path).await?;

    if result.status.success() {
        Ok(())
    } else {
        let stderr = String::from_utf8_lossy(&result.stderr);
        if stderr.trim().is_empty() {
            Err(format!("ffmpeg exited with {}", result.status))
        } else {
            Err(stderr.trim().to_string())
        }
    }
}
