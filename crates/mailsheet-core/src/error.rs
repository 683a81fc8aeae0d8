//! Error types for the core module

use mailsheet_auth::AuthError;
use mailsheet_gmail::GmailError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can end a scan
#[derive(Debug, Error)]
pub enum CoreError {
    /// Credential could not be obtained
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Provider rejected a call or returned an unusable body
    #[error("Mail API failure: {0}")]
    Api(#[from] GmailError),

    /// Store directory or attachment file could not be written
    #[error("Storage error: {0}")]
    Sink(#[from] SinkError),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Filesystem failures while persisting attachments
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to create directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Attachment name is not a plain file name
    #[error("refusing to store attachment with unsafe filename {0:?}")]
    InvalidFilename(String),
}
