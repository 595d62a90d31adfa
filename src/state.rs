//! Application state management
//!
//! Holds the server configuration and the storage credential snapshot
//! taken at startup. The snapshot is passed in explicitly (never read from
//! the environment here) so handlers stay testable without environment
//! mutation.

use crate::config::ServerConfig;
use crate::storage::{CredentialDefaults, StorageCredentials};

/// Shared application state, consumed through an `Arc` by the handlers
#[derive(Debug, Clone)]
pub struct AppState {
    /// Server configuration
    pub config: ServerConfig,

    /// Environment credential snapshot, the per-request variant's fallback
    pub storage_defaults: CredentialDefaults,

    /// Complete startup credentials for the fixed-credential variant,
    /// present only when all four fields were configured
    pub fixed_storage: Option<StorageCredentials>,
}

impl AppState {
    pub fn new(config: ServerConfig, storage_defaults: CredentialDefaults) -> Self {
        let fixed_storage = storage_defaults.clone().into_credentials();
        Self {
            config,
            storage_defaults,
            fixed_storage,
        }
    }
}
