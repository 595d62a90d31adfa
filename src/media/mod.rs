//! Media tool integration
//!
//! This service shells out to the system ffprobe/ffmpeg binaries rather
//! than linking a media library:
//! - Stream inspection via ffprobe JSON output (`probe`)
//! - Audio extraction with a stream-copy fast path and a bitrate
//!   re-encode fallback (`extract`)

pub mod extract;
pub mod probe;

pub use extract::extract_audio;
pub use probe::probe_file;

use std::process::Output;
use std::time::Duration;
use tokio::process::Command;

use crate::config::ConversionConfig;

/// Run a tool to completion, optionally bounded by a wall-clock limit.
///
/// With no limit configured this is a plain `output()` await. When the
/// limit fires the dropped future kills the child (`kill_on_drop`), so a
/// runaway tool does not outlive its request.
pub(crate) async fn run_with_timeout(
    mut command: Command,
    limit: Option<Duration>,
    tool: &str,
) -> std::result::Result<Output, String> {
    command.kill_on_drop(true);

    let output = command.output();
    let result = match limit {
        Some(limit) => match tokio::time::timeout(limit, output).await {
            Ok(result) => result,
            Err(_) => return Err(format!("{} timed out after {}s", tool, limit.as_secs())),
        },
        None => output.await,
    };

    result.map_err(|e| format!("failed to run {}: {}", tool, e))
}

/// First line of `ffmpeg -version` output, if the binary can be executed.
/// Used for the startup log.
pub async fn converter_version(config: &ConversionConfig) -> Option<String> {
    let output = Command::new(&config.ffmpeg_path)
        .arg("-version")
        .output()
        .await
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    stdout.lines().next().map(|line| line.trim().to_string())
}
