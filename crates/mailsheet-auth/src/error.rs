//! Error types for the auth module

use std::path::PathBuf;
use thiserror::Error;

/// Result type for auth operations
pub type AuthResult<T> = Result<T, AuthError>;

/// Errors that can occur while acquiring or persisting a credential
#[derive(Debug, Error)]
pub enum AuthError {
    /// Persisted credential file exists but cannot be used
    #[error("Corrupt credential file {path}: {reason}")]
    CorruptCredential { path: PathBuf, reason: String },

    /// Authorization secret file missing or malformed
    #[error("Invalid client secret file {path}: {reason}")]
    InvalidClientSecret { path: PathBuf, reason: String },

    /// OAuth2 authorization failed
    #[error("OAuth2 authorization failed: {0}")]
    AuthorizationFailed(String),

    /// Token exchange failed
    #[error("Token exchange failed: {0}")]
    TokenExchangeFailed(String),

    /// Refresh exchange failed
    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),

    /// Failed to start local callback server
    #[error("Failed to start callback server: {0}")]
    CallbackServerFailed(String),

    /// Credential could not be written back
    #[error("Failed to persist credential to {path}: {source}")]
    PersistFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
