//! Run configuration

use crate::{AttachmentFilter, CoreError, CoreResult};
use std::path::PathBuf;

const ENV_PREFIX: &str = "MAILSHEET_";

/// Everything a scan needs, passed in rather than read from globals
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractorConfig {
    /// Directory that receives accepted attachments
    pub store_dir: PathBuf,
    /// Subject to look for (compared case-insensitively)
    pub target_subject: String,
    /// OAuth2 scopes requested for the credential
    pub scopes: Vec<String>,
    /// Mailbox owner; `me` is the authenticated user
    pub user_id: String,
    /// OAuth2 client registration, read only for interactive authorization
    pub client_secret_path: PathBuf,
    /// Persisted credential
    pub token_path: PathBuf,
    pub filter: AttachmentFilter,
    /// Size of the single listed page; `None` uses the provider default
    pub max_results: Option<u32>,
    /// Loopback port for the OAuth2 callback; 0 picks a free one
    pub redirect_port: u16,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            store_dir: PathBuf::from("downloaded_attachments/"),
            target_subject: "email reto".to_string(),
            scopes: vec![mailsheet_auth::gmail::READONLY_SCOPE.to_string()],
            user_id: "me".to_string(),
            client_secret_path: PathBuf::from("user_secret.json"),
            token_path: PathBuf::from("token.json"),
            filter: AttachmentFilter::default(),
            max_results: None,
            redirect_port: 0,
        }
    }
}

impl ExtractorConfig {
    /// Defaults overlaid with `MAILSHEET_*` environment variables
    pub fn from_env() -> CoreResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with values from `lookup`, keyed by full variable name
    pub fn from_lookup<F>(lookup: F) -> CoreResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(&format!("{}{}", ENV_PREFIX, name)).filter(|v| !v.trim().is_empty())
        };
        let mut config = Self::default();

        if let Some(dir) = get("STORE_DIR") {
            config.store_dir = PathBuf::from(dir);
        }
        if let Some(subject) = get("SUBJECT") {
            config.target_subject = subject;
        }
        if let Some(scopes) = get("SCOPES") {
            config.scopes = scopes
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(user) = get("USER") {
            config.user_id = user;
        }
        if let Some(path) = get("CLIENT_SECRET") {
            config.client_secret_path = PathBuf::from(path);
        }
        if let Some(path) = get("TOKEN") {
            config.token_path = PathBuf::from(path);
        }
        if let Some(filter) = get("FILTER") {
            config.filter = filter
                .parse()
                .map_err(|e| CoreError::Config(format!("{}FILTER: {}", ENV_PREFIX, e)))?;
        }
        if let Some(max) = get("MAX_RESULTS") {
            let max = max.trim().parse::<u32>().map_err(|e| {
                CoreError::Config(format!("{}MAX_RESULTS: {}", ENV_PREFIX, e))
            })?;
            config.max_results = Some(max);
        }
        if let Some(port) = get("REDIRECT_PORT") {
            config.redirect_port = port.trim().parse::<u16>().map_err(|e| {
                CoreError::Config(format!("{}REDIRECT_PORT: {}", ENV_PREFIX, e))
            })?;
        }

        Ok(config)
    }
}
