//! Credential model and its on-disk JSON form
//!
//! The file layout is the "authorized user" JSON written by Google client
//! libraries, so a `token.json` produced elsewhere loads unchanged.

use crate::{AuthError, AuthResult};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Remaining lifetime below which a token is treated as expired
const EXPIRY_MARGIN_SECS: i64 = 300;

fn default_token_uri() -> String {
    crate::gmail::TOKEN_URL.to_string()
}

/// Access credential for the mail provider API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Access token for API calls
    pub token: String,
    /// Refresh token for obtaining new access tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Token endpoint used for refresh
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    /// Granted scopes
    #[serde(default)]
    pub scopes: Vec<String>,
    /// Access token expiry; `None` means the token does not expire
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

/// Where a credential sits in its lifecycle relative to a scope request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialState {
    /// Usable as-is
    Valid,
    /// Expired, but carries a refresh token
    Refreshable,
    /// Needs a fresh interactive authorization
    Unusable,
}

impl Credential {
    /// Check if the access token is expired or about to expire
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expiry {
            Some(expiry) => expiry - now < Duration::seconds(EXPIRY_MARGIN_SECS),
            None => false,
        }
    }

    /// True when every requested scope was granted
    pub fn has_scopes(&self, requested: &[String]) -> bool {
        requested.iter().all(|scope| self.scopes.contains(scope))
    }

    /// Classify this credential for the given scope request.
    ///
    /// A scope shortfall is never refreshable: refreshing keeps the
    /// original grant.
    pub fn state(&self, requested: &[String]) -> CredentialState {
        if !self.has_scopes(requested) {
            return CredentialState::Unusable;
        }
        if !self.token.is_empty() && !self.is_expired() {
            CredentialState::Valid
        } else if self.refresh_token.is_some() {
            CredentialState::Refreshable
        } else {
            CredentialState::Unusable
        }
    }
}

/// JSON file holding a single persisted credential
#[derive(Debug, Clone)]
pub struct CredentialFile {
    path: PathBuf,
}

impl CredentialFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted credential; `Ok(None)` when no file exists
    pub fn load(&self) -> AuthResult<Option<Credential>> {
        let json = match std::fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No credential file at {}", self.path.display());
                return Ok(None);
            }
            Err(e) => {
                return Err(AuthError::CorruptCredential {
                    path: self.path.clone(),
                    reason: e.to_string(),
                })
            }
        };

        let credential: Credential =
            serde_json::from_str(&json).map_err(|e| AuthError::CorruptCredential {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;

        debug!("Loaded credential from {}", self.path.display());
        Ok(Some(credential))
    }

    /// Overwrite the persisted credential.
    ///
    /// Writes a sibling temp file first and renames it into place, so the
    /// previous file survives any failure before the rename.
    pub fn save(&self, credential: &Credential) -> AuthResult<()> {
        let persist_err = |source| AuthError::PersistFailed {
            path: self.path.clone(),
            source,
        };

        let json = serde_json::to_string_pretty(credential)
            .map_err(|e| persist_err(std::io::Error::other(e)))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(persist_err)?;
        }

        let tmp_path = self.temp_path();
        let mut options = std::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(&tmp_path).map_err(persist_err)?;
        file.write_all(json.as_bytes()).map_err(persist_err)?;
        file.sync_all().map_err(persist_err)?;
        drop(file);

        std::fs::rename(&tmp_path, &self.path).map_err(persist_err)?;

        info!("Saved credential to {}", self.path.display());
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "credential".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
