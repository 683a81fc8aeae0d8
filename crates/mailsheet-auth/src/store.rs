//! Credential lifecycle: load, refresh, or authorize, then persist

use crate::{AuthResult, Credential, CredentialFile, CredentialState};
use async_trait::async_trait;
use tracing::{debug, info};

/// Token endpoint operations the store depends on
#[async_trait]
pub trait Authorizer: Send + Sync {
    /// Exchange the credential's refresh token for a new access token
    async fn refresh(&self, credential: &Credential) -> AuthResult<Credential>;

    /// Run an interactive authorization for the given scopes
    async fn authorize(&self, scopes: &[String]) -> AuthResult<Credential>;
}

/// Hands out a usable credential, keeping the credential file current
pub struct CredentialStore<A> {
    file: CredentialFile,
    authorizer: A,
}

impl<A: Authorizer> CredentialStore<A> {
    pub fn new(file: CredentialFile, authorizer: A) -> Self {
        Self { file, authorizer }
    }

    pub fn file(&self) -> &CredentialFile {
        &self.file
    }

    /// Return a valid credential for `scopes`.
    ///
    /// The file is only written after a refresh or authorization succeeded;
    /// a failure leaves whatever was persisted before.
    pub async fn load_or_create(&self, scopes: &[String]) -> AuthResult<Credential> {
        if let Some(mut credential) = self.file.load()? {
            // Files without a scope list are taken to hold the requested grant
            if credential.scopes.is_empty() {
                credential.scopes = scopes.to_vec();
            }

            match credential.state(scopes) {
                CredentialState::Valid => {
                    debug!("Persisted credential is valid");
                    return Ok(credential);
                }
                CredentialState::Refreshable => {
                    info!("Persisted credential expired, refreshing");
                    let refreshed = self.authorizer.refresh(&credential).await?;
                    self.file.save(&refreshed)?;
                    return Ok(refreshed);
                }
                CredentialState::Unusable => {
                    info!("Persisted credential cannot be used, reauthorizing");
                }
            }
        }

        let credential = self.authorizer.authorize(scopes).await?;
        self.file.save(&credential)?;
        Ok(credential)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AuthError;
    use chrono::{Duration, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const SCOPE: &str = crate::gmail::READONLY_SCOPE;

    #[derive(Default)]
    struct CountingAuthorizer {
        refreshes: AtomicUsize,
        authorizations: AtomicUsize,
        fail_refresh: bool,
    }

    #[async_trait]
    impl Authorizer for CountingAuthorizer {
        async fn refresh(&self, credential: &Credential) -> AuthResult<Credential> {
            self.refreshes.fetch_add(1, Ordering::SeqCst);
            if self.fail_refresh {
                return Err(AuthError::RefreshFailed("invalid_grant".to_string()));
            }
            Ok(Credential {
                token: "refreshed".to_string(),
                expiry: Some(Utc::now() + Duration::hours(1)),
                ..credential.clone()
            })
        }

        async fn authorize(&self, scopes: &[String]) -> AuthResult<Credential> {
            self.authorizations.fetch_add(1, Ordering::SeqCst);
            Ok(credential("authorized", Some("1//new"), scopes, Duration::hours(1)))
        }
    }

    fn credential(
        token: &str,
        refresh: Option<&str>,
        scopes: &[String],
        lifetime: Duration,
    ) -> Credential {
        Credential {
            token: token.to_string(),
            refresh_token: refresh.map(str::to_string),
            token_uri: crate::gmail::TOKEN_URL.to_string(),
            client_id: None,
            client_secret: None,
            scopes: scopes.to_vec(),
            expiry: Some(Utc::now() + lifetime),
        }
    }

    fn scopes() -> Vec<String> {
        vec![SCOPE.to_string()]
    }

    fn store_with(
        dir: &tempfile::TempDir,
        authorizer: CountingAuthorizer,
    ) -> CredentialStore<CountingAuthorizer> {
        CredentialStore::new(CredentialFile::new(dir.path().join("token.json")), authorizer)
    }

    #[tokio::test]
    async fn test_valid_credential_is_returned_without_refresh() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(&dir, CountingAuthorizer::default());
        let persisted = credential("valid", Some("1//r"), &scopes(), Duration::hours(1));
        store.file().save(&persisted).unwrap();

        let first = store.load_or_create(&scopes()).await.unwrap();
        let second = store.load_or_create(&scopes()).await.unwrap();

        assert_eq!(first, persisted);
        assert_eq!(second, first);
        assert_eq!(store.authorizer.refreshes.load(Ordering::SeqCst), 0);
        assert_eq!(store.authorizer.authorizations.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_expired_credential_is_refreshed_and_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(&dir, CountingAuthorizer::default());
        let expired = credential("stale", Some("1//r"), &scopes(), Duration::hours(-1));
        store.file().save(&expired).unwrap();

        let refreshed = store.load_or_create(&scopes()).await.unwrap();

        assert_eq!(refreshed.token, "refreshed");
        assert_eq!(store.authorizer.refreshes.load(Ordering::SeqCst), 1);
        assert_eq!(store.authorizer.authorizations.load(Ordering::SeqCst), 0);

        let on_disk = store.file().load().unwrap().unwrap();
        assert_eq!(on_disk, refreshed);
        assert!(on_disk.expiry > expired.expiry);
    }

    #[tokio::test]
    async fn test_absent_credential_runs_authorization() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(&dir, CountingAuthorizer::default());

        let created = store.load_or_create(&scopes()).await.unwrap();

        assert_eq!(created.token, "authorized");
        assert_eq!(store.authorizer.authorizations.load(Ordering::SeqCst), 1);
        assert_eq!(store.file().load().unwrap(), Some(created));
    }

    #[tokio::test]
    async fn test_scope_shortfall_reauthorizes_instead_of_refreshing() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(&dir, CountingAuthorizer::default());
        let narrow = vec!["https://www.googleapis.com/auth/gmail.labels".to_string()];
        store
            .file()
            .save(&credential("t", Some("1//r"), &narrow, Duration::hours(-1)))
            .unwrap();

        store.load_or_create(&scopes()).await.unwrap();

        assert_eq!(store.authorizer.refreshes.load(Ordering::SeqCst), 0);
        assert_eq!(store.authorizer.authorizations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_persisted_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(
            &dir,
            CountingAuthorizer {
                fail_refresh: true,
                ..Default::default()
            },
        );
        store
            .file()
            .save(&credential("stale", Some("1//r"), &scopes(), Duration::hours(-1)))
            .unwrap();
        let before = std::fs::read(store.file().path()).unwrap();

        let err = store.load_or_create(&scopes()).await.unwrap_err();

        assert!(matches!(err, AuthError::RefreshFailed(_)));
        assert_eq!(std::fs::read(store.file().path()).unwrap(), before);
        assert_eq!(store.authorizer.authorizations.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(&dir, CountingAuthorizer::default());
        std::fs::write(store.file().path(), "[]").unwrap();

        let err = store.load_or_create(&scopes()).await.unwrap_err();

        assert!(matches!(err, AuthError::CorruptCredential { .. }));
        assert_eq!(store.authorizer.authorizations.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_scope_list_adopts_request() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with(&dir, CountingAuthorizer::default());
        store
            .file()
            .save(&credential("valid", None, &[], Duration::hours(1)))
            .unwrap();

        let loaded = store.load_or_create(&scopes()).await.unwrap();

        assert_eq!(loaded.scopes, scopes());
        assert_eq!(store.authorizer.authorizations.load(Ordering::SeqCst), 0);
    }
}
