//! Credential acquisition for a run

use crate::{CoreResult, ExtractorConfig};
use mailsheet_auth::{Credential, CredentialFile, CredentialStore, DesktopAuthorizer};
use mailsheet_gmail::GmailClient;

/// Load, refresh or interactively create the credential named by `config`
pub async fn acquire_credential(config: &ExtractorConfig) -> CoreResult<Credential> {
    let store = CredentialStore::new(
        CredentialFile::new(&config.token_path),
        DesktopAuthorizer::new(&config.client_secret_path, config.redirect_port),
    );
    Ok(store.load_or_create(&config.scopes).await?)
}

/// Authenticated Gmail client for `config`
pub async fn connect(config: &ExtractorConfig) -> CoreResult<GmailClient> {
    let credential = acquire_credential(config).await?;
    Ok(GmailClient::new(&credential))
}
