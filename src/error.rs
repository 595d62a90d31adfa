use thiserror::Error;

/// Main error type for the audio extraction service
#[derive(Error, Debug)]
pub enum ExtractError {
    /// The probe tool could not be run, exited non-zero, or produced
    /// output that does not parse as stream metadata.
    #[error("Probe failed: {0}")]
    ProbeFailure(String),

    /// The input was probed successfully but contains no audio stream.
    #[error("Input file contains no audio stream")]
    NoAudioStream,

    /// Both the stream-copy and the re-encode attempt exited non-zero.
    /// Carries the diagnostic text of the last attempt.
    #[error("FFmpeg processing failed: {0}")]
    ConversionFailure(String),

    /// One or more storage credential fields were absent from both the
    /// request and the environment. Lists every missing field.
    #[error("Missing storage credentials: {}", .0.join(", "))]
    MissingCredentials(Vec<&'static str>),

    /// The storage PutObject call (or reading the artifact for upload)
    /// failed. Carries the SDK's error context text.
    #[error("Failed to upload to storage: {0}")]
    UploadFailure(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, ExtractError>;
