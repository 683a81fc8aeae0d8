//! OAuth2 client secret file
//!
//! The file is downloaded from the provider's developer console and is never
//! written by mailsheet. Both the `installed` and `web` application shapes
//! are accepted.

use crate::{AuthError, AuthResult};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

/// OAuth2 client registration read from the secret file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientSecret {
    pub client_id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "lowercase")]
enum ClientSecretFile {
    Installed(ClientSecret),
    Web(ClientSecret),
}

fn default_auth_uri() -> String {
    crate::gmail::AUTH_URL.to_string()
}

fn default_token_uri() -> String {
    crate::gmail::TOKEN_URL.to_string()
}

impl ClientSecret {
    /// Read and parse a client secret file
    pub fn from_file(path: impl AsRef<Path>) -> AuthResult<Self> {
        let path = path.as_ref();
        let invalid = |reason: String| AuthError::InvalidClientSecret {
            path: path.to_path_buf(),
            reason,
        };

        let json = std::fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
        let secret = Self::from_json(&json).map_err(|e| invalid(e.to_string()))?;

        debug!("Loaded client secret for {}", secret.client_id);
        Ok(secret)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let file: ClientSecretFile = serde_json::from_str(json)?;
        Ok(match file {
            ClientSecretFile::Installed(secret) | ClientSecretFile::Web(secret) => secret,
        })
    }
}
