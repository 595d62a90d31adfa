//! End-to-end integration tests

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::ServerConfig;
use crate::error::ExtractError;
use crate::http::create_router;
use crate::pipeline::{convert, ConvertOutcome, ConvertRequest, UploadPlan};
use crate::state::AppState;
use crate::storage::{CredentialDefaults, CredentialOverrides, StorageCredentials};
use crate::types::AudioFormat;

/// Both tools must be runnable; fixtures and conversions need them
fn tools_available() -> bool {
    let check = |tool: &str| {
        std::process::Command::new(tool)
            .arg("-version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    };
    check("ffmpeg") && check("ffprobe")
}

fn run_ffmpeg(args: &[&str], output: &Path) {
    let result = std::process::Command::new("ffmpeg")
        .args(args)
        .arg("-y")
        .arg(output)
        .output()
        .expect("failed to run ffmpeg for fixture generation");
    assert!(
        result.status.success(),
        "fixture generation failed: {}",
        String::from_utf8_lossy(&result.stderr)
    );
}

/// One second of a 440 Hz sine tone as PCM WAV
fn tone_wav(dir: &Path) -> PathBuf {
    let path = dir.join("tone.wav");
    run_ffmpeg(
        &["-f", "lavfi", "-i", "sine=frequency=440:duration=1"],
        &path,
    );
    path
}

/// Ten seconds of silent AAC audio in an MP4 container
fn silent_mp4(dir: &Path) -> PathBuf {
    let path = dir.join("silent.mp4");
    run_ffmpeg(
        &[
            "-f", "lavfi", "-i", "anullsrc=r=44100:cl=stereo", "-t", "10", "-c:a", "aac",
        ],
        &path,
    );
    path
}

/// One second of video with no audio track (native mpeg4 encoder, so this
/// works on ffmpeg builds without libx264)
fn video_only_mp4(dir: &Path) -> PathBuf {
    let path = dir.join("video_only.mp4");
    run_ffmpeg(
        &[
            "-f", "lavfi", "-i", "testsrc2=duration=1:size=128x72:rate=10", "-an", "-c:v",
            "mpeg4",
        ],
        &path,
    );
    path
}

fn config_with_work_dir(work_dir: &Path) -> ServerConfig {
    let mut config = ServerConfig::default();
    config.conversion.work_dir = work_dir.to_path_buf();
    config
}

/// Stand-in probe and convert tools, so tests past the conversion stage run
/// without ffmpeg installed. The probe stub reports one audio stream; the
/// convert stub writes a few bytes to its last argument, the output path.
#[cfg(unix)]
fn stub_tools(dir: &Path) -> (PathBuf, PathBuf) {
    use std::os::unix::fs::PermissionsExt;

    let ffprobe = dir.join("ffprobe-stub");
    std::fs::write(
        &ffprobe,
        "#!/bin/sh\necho '{\"streams\": [{\"index\": 0, \"codec_type\": \"audio\", \"codec_name\": \"aac\"}]}'\n",
    )
    .unwrap();

    let ffmpeg = dir.join("ffmpeg-stub");
    std::fs::write(
        &ffmpeg,
        "#!/bin/sh\nfor out; do :; done\nprintf data > \"$out\"\n",
    )
    .unwrap();

    for tool in [&ffprobe, &ffmpeg] {
        let mut permissions = std::fs::metadata(tool).unwrap().permissions();
        permissions.set_mode(0o755);
        std::fs::set_permissions(tool, permissions).unwrap();
    }
    (ffprobe, ffmpeg)
}

fn assert_riff_wav(path: &Path) {
    let bytes = std::fs::read(path).expect("artifact should be readable");
    assert!(bytes.len() > 44, "WAV output shorter than its header");
    assert_eq!(&bytes[0..4], b"RIFF");
    assert_eq!(&bytes[8..12], b"WAVE");
}

#[tokio::test]
async fn test_silent_mp4_to_wav_returns_local_path() {
    if !tools_available() {
        eprintln!("skipping: ffmpeg/ffprobe not installed");
        return;
    }
    let fixtures = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let input = silent_mp4(fixtures.path());
    let config = config_with_work_dir(work.path());

    // Whichever attempt lands, the artifact must be a well-formed RIFF
    // file at the returned local path
    let request = ConvertRequest {
        input_file: input,
        format: AudioFormat::Wav,
        bitrate: "192k".to_string(),
        upload: UploadPlan::Skip,
    };
    let outcome = convert(request, &config).await.unwrap();

    match outcome {
        ConvertOutcome::LocalFile { path } => {
            assert!(path.extension().map(|e| e == "wav").unwrap_or(false));
            assert!(path.starts_with(work.path()));
            assert_riff_wav(&path);
        }
        other => panic!("expected a local file outcome, got {:?}", other),
    }
}

#[tokio::test]
async fn test_stream_copy_fast_path() {
    if !tools_available() {
        eprintln!("skipping: ffmpeg/ffprobe not installed");
        return;
    }
    let fixtures = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let input = tone_wav(fixtures.path());
    let config = config_with_work_dir(work.path());

    // PCM into a fresh WAV container succeeds on the first, copy attempt
    let request = ConvertRequest {
        input_file: input,
        format: AudioFormat::Wav,
        bitrate: "192k".to_string(),
        upload: UploadPlan::Skip,
    };
    let outcome = convert(request, &config).await.unwrap();

    match outcome {
        ConvertOutcome::LocalFile { path } => assert_riff_wav(&path),
        other => panic!("expected a local file outcome, got {:?}", other),
    }
}

#[tokio::test]
async fn test_reencode_fallback_after_copy_failure() {
    if !tools_available() {
        eprintln!("skipping: ffmpeg/ffprobe not installed");
        return;
    }
    let fixtures = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let input = tone_wav(fixtures.path());
    let config = config_with_work_dir(work.path());

    // PCM cannot be stream-copied into an ADTS container, so the first
    // attempt always fails and the re-encode fallback must produce the file
    let request = ConvertRequest {
        input_file: input,
        format: AudioFormat::Aac,
        bitrate: "192k".to_string(),
        upload: UploadPlan::Skip,
    };
    let outcome = convert(request, &config).await.unwrap();

    match outcome {
        ConvertOutcome::LocalFile { path } => {
            let bytes = std::fs::read(&path).expect("artifact should be readable");
            assert!(bytes.len() > 7, "ADTS output shorter than one frame header");
            // ADTS syncword
            assert_eq!(bytes[0], 0xFF);
            assert_eq!(bytes[1] & 0xF0, 0xF0);
        }
        other => panic!("expected a local file outcome, got {:?}", other),
    }
}

#[tokio::test]
async fn test_video_only_input_fails_with_no_audio_stream() {
    if !tools_available() {
        eprintln!("skipping: ffmpeg/ffprobe not installed");
        return;
    }
    let fixtures = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let input = video_only_mp4(fixtures.path());
    let config = config_with_work_dir(work.path());

    let request = ConvertRequest {
        input_file: input,
        format: AudioFormat::Mp3,
        bitrate: "192k".to_string(),
        upload: UploadPlan::Skip,
    };
    let err = convert(request, &config).await.unwrap_err();

    assert!(matches!(err, ExtractError::NoAudioStream));
    // rejected before conversion, so nothing was written to the work dir
    assert_eq!(std::fs::read_dir(work.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_missing_credentials_cleans_up_artifact() {
    if !tools_available() {
        eprintln!("skipping: ffmpeg/ffprobe not installed");
        return;
    }
    let fixtures = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let input = silent_mp4(fixtures.path());
    let config = config_with_work_dir(work.path());

    // Credential resolution runs at the upload stage, after conversion;
    // the converted artifact must still be removed before the error surfaces
    let request = ConvertRequest {
        input_file: input,
        format: AudioFormat::Wav,
        bitrate: "192k".to_string(),
        upload: UploadPlan::Resolve {
            overrides: CredentialOverrides {
                account_id: Some("only-one-field".to_string()),
                ..Default::default()
            },
            defaults: CredentialDefaults::default(),
        },
    };
    let err = convert(request, &config).await.unwrap_err();

    match err {
        ExtractError::MissingCredentials(missing) => {
            assert_eq!(missing, vec!["access_key", "secret_key", "bucket_name"]);
        }
        other => panic!("expected MissingCredentials, got {other}"),
    }
    assert_eq!(std::fs::read_dir(work.path()).unwrap().count(), 0);
}

#[cfg(unix)]
#[tokio::test]
async fn test_upload_failure_cleans_up_artifact() {
    let tools = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let (ffprobe, ffmpeg) = stub_tools(tools.path());

    let mut config = config_with_work_dir(work.path());
    config.conversion.ffprobe_path = ffprobe.to_string_lossy().into_owned();
    config.conversion.ffmpeg_path = ffmpeg.to_string_lossy().into_owned();
    // reserved name (RFC 2606), never resolves; the PutObject call fails
    // in transport after a successful conversion
    config.storage.domain = "upload-test.invalid".to_string();

    let request = ConvertRequest {
        input_file: tools.path().join("in.mp4"),
        format: AudioFormat::Mp3,
        bitrate: "192k".to_string(),
        upload: UploadPlan::Fixed(StorageCredentials {
            account_id: "stub-account".to_string(),
            access_key: "stub-access".to_string(),
            secret_key: "stub-secret".to_string(),
            bucket_name: "stub-bucket".to_string(),
        }),
    };
    let err = convert(request, &config).await.unwrap_err();

    assert!(matches!(err, ExtractError::UploadFailure(_)));
    // the converted artifact was removed before the error surfaced
    assert_eq!(std::fs::read_dir(work.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_live_server_round_trip() {
    if !tools_available() {
        eprintln!("skipping: ffmpeg/ffprobe not installed");
        return;
    }
    let fixtures = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let input = tone_wav(fixtures.path());

    let state = Arc::new(AppState::new(
        config_with_work_dir(work.path()),
        CredentialDefaults::default(),
    ));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = reqwest::Client::new();
    let base = format!("http://{}", addr);

    let health = client
        .get(format!("{}/health", base))
        .send()
        .await
        .unwrap();
    assert_eq!(health.status(), 200);
    assert_eq!(health.text().await.unwrap(), "OK");

    let response = client
        .post(format!("{}/convert/custom-storage", base))
        .json(&serde_json::json!({
            "input_file": input.to_string_lossy(),
            "format": "wav",
            "upload_to_storage": false
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    let result_path = PathBuf::from(body["result"].as_str().unwrap());
    assert!(result_path.exists());
    assert!(result_path
        .extension()
        .map(|e| e == "wav")
        .unwrap_or(false));

    server.abort();
}
