//! S3-compatible object storage
//!
//! Credential handling and the upload client for an R2-style service:
//! endpoint `https://{account_id}.{domain}`, SigV4 signing, region "auto",
//! one PutObject per request, public object URLs of the form
//! `https://{bucket}.{domain}/{key}`.

use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use std::fmt;
use std::path::Path;

use crate::error::{ExtractError, Result};

/// Complete set of storage credentials bound to one bucket
#[derive(Clone)]
pub struct StorageCredentials {
    pub account_id: String,
    pub access_key: String,
    pub secret_key: String,
    pub bucket_name: String,
}

impl StorageCredentials {
    /// Service endpoint for this account
    pub fn endpoint_url(&self, domain: &str) -> String {
        format!("https://{}.{}", self.account_id, domain)
    }
}

// The secret key stays out of logs.
impl fmt::Debug for StorageCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageCredentials")
            .field("account_id", &self.account_id)
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("bucket_name", &self.bucket_name)
            .finish()
    }
}

/// Environment-provided credential fields, captured once at startup.
/// Empty variables count as absent.
#[derive(Clone, Default)]
pub struct CredentialDefaults {
    pub account_id: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub bucket_name: Option<String>,
}

impl fmt::Debug for CredentialDefaults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialDefaults")
            .field("account_id", &self.account_id)
            .field("access_key", &self.access_key)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "<redacted>"))
            .field("bucket_name", &self.bucket_name)
            .finish()
    }
}

impl CredentialDefaults {
    /// Snapshot the R2_* environment variables
    pub fn from_env() -> Self {
        Self {
            account_id: read_env("R2_ACCOUNT_ID"),
            access_key: read_env("R2_ACCESS_KEY_ID"),
            secret_key: read_env("R2_SECRET_ACCESS_KEY"),
            bucket_name: read_env("R2_BUCKET_NAME"),
        }
    }

    /// Complete credentials, if every field is present
    pub fn into_credentials(self) -> Option<StorageCredentials> {
        match (
            self.account_id,
            self.access_key,
            self.secret_key,
            self.bucket_name,
        ) {
            (Some(account_id), Some(access_key), Some(secret_key), Some(bucket_name)) => {
                Some(StorageCredentials {
                    account_id,
                    access_key,
                    secret_key,
                    bucket_name,
                })
            }
            _ => None,
        }
    }
}

/// Per-request credential fields (request-scoped variant).
/// Empty strings count as absent, like an omitted field.
#[derive(Debug, Clone, Default)]
pub struct CredentialOverrides {
    pub account_id: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub bucket_name: Option<String>,
}

/// Merge request values over environment defaults, field by field, then
/// check presence of all four fields atomically.
///
/// A request value always wins over an environment value for its own field;
/// the presence check runs once over the merged result, so three supplied
/// fields with the fourth absent everywhere fail as a unit rather than
/// producing a partial client.
pub fn resolve_credentials(
    overrides: CredentialOverrides,
    defaults: &CredentialDefaults,
) -> Result<StorageCredentials> {
    let account_id = pick(overrides.account_id, &defaults.account_id);
    let access_key = pick(overrides.access_key, &defaults.access_key);
    let secret_key = pick(overrides.secret_key, &defaults.secret_key);
    let bucket_name = pick(overrides.bucket_name, &defaults.bucket_name);

    let mut missing = Vec::new();
    if account_id.is_none() {
        missing.push("account_id");
    }
    if access_key.is_none() {
        missing.push("access_key");
    }
    if secret_key.is_none() {
        missing.push("secret_key");
    }
    if bucket_name.is_none() {
        missing.push("bucket_name");
    }

    match (account_id, access_key, secret_key, bucket_name) {
        (Some(account_id), Some(access_key), Some(secret_key), Some(bucket_name)) => {
            Ok(StorageCredentials {
                account_id,
                access_key,
                secret_key,
                bucket_name,
            })
        }
        _ => Err(ExtractError::MissingCredentials(missing)),
    }
}

fn pick(override_value: Option<String>, default_value: &Option<String>) -> Option<String> {
    override_value
        .filter(|v| !v.is_empty())
        .or_else(|| default_value.clone().filter(|v| !v.is_empty()))
}

fn read_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Upload client bound to one bucket
#[derive(Debug, Clone)]
pub struct StorageClient {
    client: aws_sdk_s3::Client,
    bucket: String,
    domain: String,
}

impl StorageClient {
    /// Build a client from resolved credentials. No network traffic happens
    /// until the first request.
    pub fn new(credentials: &StorageCredentials, domain: &str) -> Self {
        let provider = Credentials::new(
            credentials.access_key.clone(),
            credentials.secret_key.clone(),
            None,
            None,
            "audio-extract",
        );
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("auto"))
            .endpoint_url(credentials.endpoint_url(domain))
            .credentials_provider(provider)
            // R2 account endpoints address buckets in the path
            .force_path_style(true)
            .build();

        Self {
            client: aws_sdk_s3::Client::from_conf(config),
            bucket: credentials.bucket_name.clone(),
            domain: domain.to_string(),
        }
    }

    /// Public URL of an object in this bucket
    pub fn object_url(&self, key: &str) -> String {
        format!("https://{}.{}/{}", self.bucket, self.domain, key)
    }

    /// Upload one local file as `key` and return its public URL
    pub async fn put_file(&self, path: &Path, key: &str, content_type: &str) -> Result<String> {
        let body = ByteStream::from_path(path).await.map_err(|e| {
            ExtractError::UploadFailure(format!(
                "failed to read artifact {}: {}",
                path.display(),
                e
            ))
        })?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| ExtractError::UploadFailure(DisplayErrorContext(e).to_string()))?;

        tracing::debug!(bucket = %self.bucket, key = %key, "object uploaded");
        Ok(self.object_url(key))
    }
}
