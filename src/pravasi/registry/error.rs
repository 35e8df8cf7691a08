use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Error type covering rejected registry operations as well as the failures
/// that can occur while persisting, exporting, or syncing the registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Malformed or out-of-range input for a single field.
    #[error("invalid {field}: {message}")]
    Validation { field: String, message: String },

    /// A referenced identifier does not exist.
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    /// A uniqueness invariant would be violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The operation targets a closed work year or otherwise breaks the
    /// lifecycle rules of the affected entity.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Raised when a persisted snapshot cannot be used.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Raised when the webhook delivery did not succeed.
    #[error("sync failed: {0}")]
    Sync(String),

    /// Raised when a sync is requested before an endpoint is configured.
    #[error("no integration endpoint configured; set one with `endpoint set <url>`")]
    MissingEndpoint,

    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when JSON parsing or serialization fails.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Raised when the configuration file is not valid TOML.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Errors bubbled up from the Excel writer implementation.
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Raised when a configuration value is unusable.
    #[error("configuration error: {0}")]
    Config(String),

    /// Raised when the user provides a path that does not exist.
    #[error("input file not found: {0}")]
    MissingInput(PathBuf),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}

impl RegistryError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn not_found(entity: &'static str, id: &str) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}
