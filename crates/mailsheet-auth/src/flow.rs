//! OAuth2 installed-app flow with PKCE
//!
//! Implements the authorization code flow (RFC 6749 + RFC 7636) against a
//! loopback redirect: a one-shot HTTP listener on 127.0.0.1 receives the
//! browser callback, then the code is exchanged for tokens.

use crate::store::Authorizer;
use crate::{AuthError, AuthResult, ClientSecret, Credential};
use async_trait::async_trait;
use oauth2::basic::{BasicClient, BasicTokenResponse};
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, CsrfToken, PkceCodeChallenge, RedirectUrl,
    RefreshToken, Scope, TokenResponse, TokenUrl,
};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

/// Browser-driven authorization for a desktop ("installed") client
pub struct InstalledAppFlow {
    secret: ClientSecret,
    client: BasicClient,
    /// Loopback port for the callback; 0 picks a free one
    redirect_port: u16,
}

impl InstalledAppFlow {
    pub fn new(secret: ClientSecret, redirect_port: u16) -> AuthResult<Self> {
        let auth_url = AuthUrl::new(secret.auth_uri.clone())
            .map_err(|e| AuthError::InvalidConfig(format!("Invalid auth URL: {}", e)))?;
        let token_url = TokenUrl::new(secret.token_uri.clone())
            .map_err(|e| AuthError::InvalidConfig(format!("Invalid token URL: {}", e)))?;

        let client = BasicClient::new(
            ClientId::new(secret.client_id.clone()),
            secret.client_secret.clone().map(oauth2::ClientSecret::new),
            auth_url,
            Some(token_url),
        );

        Ok(Self {
            secret,
            client,
            redirect_port,
        })
    }

    /// Build a credential from a token endpoint response
    fn credential_from_response(
        &self,
        response: &BasicTokenResponse,
        fallback_scopes: &[String],
        fallback_refresh: Option<&str>,
    ) -> Credential {
        let expiry = response
            .expires_in()
            .and_then(|lifetime| expiry_after(chrono::Utc::now(), lifetime));

        let scopes = response
            .scopes()
            .map(|granted| granted.iter().map(|s| s.as_str().to_string()).collect())
            .unwrap_or_else(|| fallback_scopes.to_vec());

        Credential {
            token: response.access_token().secret().clone(),
            refresh_token: response
                .refresh_token()
                .map(|t| t.secret().clone())
                .or_else(|| fallback_refresh.map(str::to_string)),
            token_uri: self.secret.token_uri.clone(),
            client_id: Some(self.secret.client_id.clone()),
            client_secret: self.secret.client_secret.clone(),
            scopes,
            expiry,
        }
    }
}

#[async_trait]
impl Authorizer for InstalledAppFlow {
    async fn refresh(&self, credential: &Credential) -> AuthResult<Credential> {
        let refresh_token = credential
            .refresh_token
            .as_deref()
            .ok_or_else(|| AuthError::RefreshFailed("no refresh token".to_string()))?;

        debug!("Refreshing access token");
        let response = self
            .client
            .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()))
            .request_async(oauth2::reqwest::async_http_client)
            .await
            .map_err(|e| AuthError::RefreshFailed(e.to_string()))?;

        info!("Access token refreshed");
        Ok(self.credential_from_response(&response, &credential.scopes, Some(refresh_token)))
    }

    async fn authorize(&self, scopes: &[String]) -> AuthResult<Credential> {
        let listener = TcpListener::bind(("127.0.0.1", self.redirect_port))
            .await
            .map_err(|e| AuthError::CallbackServerFailed(e.to_string()))?;
        let port = listener
            .local_addr()
            .map_err(|e| AuthError::CallbackServerFailed(e.to_string()))?
            .port();

        let redirect_url = RedirectUrl::new(format!("http://127.0.0.1:{}/", port))
            .map_err(|e| AuthError::InvalidConfig(format!("Invalid redirect URL: {}", e)))?;
        let client = self.client.clone().set_redirect_uri(redirect_url);

        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();
        let mut auth_request = client
            .authorize_url(CsrfToken::new_random)
            .set_pkce_challenge(pkce_challenge)
            .add_extra_param("access_type", "offline")
            .add_extra_param("prompt", "consent");
        for scope in scopes {
            auth_request = auth_request.add_scope(Scope::new(scope.clone()));
        }
        let (auth_url, csrf_token) = auth_request.url();

        println!(
            "Please visit this URL to authorize this application: {}",
            auth_url
        );
        info!("Listening for OAuth2 callback on port {}", port);

        let (code, state) = wait_for_callback(&listener).await?;

        if state != *csrf_token.secret() {
            return Err(AuthError::AuthorizationFailed(
                "CSRF token mismatch".to_string(),
            ));
        }

        let response = client
            .exchange_code(AuthorizationCode::new(code))
            .set_pkce_verifier(pkce_verifier)
            .request_async(oauth2::reqwest::async_http_client)
            .await
            .map_err(|e| AuthError::TokenExchangeFailed(e.to_string()))?;

        info!("Authorization completed");
        Ok(self.credential_from_response(&response, scopes, None))
    }
}

/// Authorizer that reads the client secret file only when it has to.
///
/// Refresh uses the client registration stored in the credential itself,
/// so an existing token keeps working without the secret file present.
pub struct DesktopAuthorizer {
    client_secret_path: PathBuf,
    redirect_port: u16,
}

impl DesktopAuthorizer {
    pub fn new(client_secret_path: impl Into<PathBuf>, redirect_port: u16) -> Self {
        Self {
            client_secret_path: client_secret_path.into(),
            redirect_port,
        }
    }

    fn flow_for(&self, credential: Option<&Credential>) -> AuthResult<InstalledAppFlow> {
        let secret = match credential {
            Some(Credential {
                client_id: Some(client_id),
                client_secret,
                token_uri,
                ..
            }) => ClientSecret {
                client_id: client_id.clone(),
                client_secret: client_secret.clone(),
                auth_uri: crate::gmail::AUTH_URL.to_string(),
                token_uri: token_uri.clone(),
            },
            _ => ClientSecret::from_file(&self.client_secret_path)?,
        };
        InstalledAppFlow::new(secret, self.redirect_port)
    }
}

#[async_trait]
impl Authorizer for DesktopAuthorizer {
    async fn refresh(&self, credential: &Credential) -> AuthResult<Credential> {
        self.flow_for(Some(credential))?.refresh(credential).await
    }

    async fn authorize(&self, scopes: &[String]) -> AuthResult<Credential> {
        self.flow_for(None)?.authorize(scopes).await
    }
}

/// Accept connections until one carries the OAuth2 redirect query.
///
/// Browsers may hit the listener (favicon, preconnect) before the real
/// callback arrives; those requests get a 404 and are ignored.
async fn wait_for_callback(listener: &TcpListener) -> AuthResult<(String, String)> {
    loop {
        let (stream, _) = listener
            .accept()
            .await
            .map_err(|e| AuthError::CallbackServerFailed(e.to_string()))?;

        let mut reader = BufReader::new(stream);
        let mut request_line = String::new();
        reader
            .read_line(&mut request_line)
            .await
            .map_err(|e| AuthError::CallbackServerFailed(e.to_string()))?;
        let mut stream = reader.into_inner();

        debug!("Received callback request: {}", request_line.trim());

        if !request_line.contains('?') {
            send_http_response(&mut stream, "404 Not Found", "Not Found", "").await;
            continue;
        }

        return match parse_callback_url(&request_line) {
            Ok(pair) => {
                send_http_response(
                    &mut stream,
                    "200 OK",
                    "Success",
                    "The authentication flow has completed. You may close this window.",
                )
                .await;
                Ok(pair)
            }
            Err(e) => {
                send_http_response(&mut stream, "400 Bad Request", "Error", &e.to_string()).await;
                Err(e)
            }
        };
    }
}

/// Parse the authorization code and state from a callback request line
fn parse_callback_url(request_line: &str) -> AuthResult<(String, String)> {
    // Request line format: "GET /?code=xxx&state=yyy HTTP/1.1"
    let path = request_line
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| AuthError::AuthorizationFailed("Invalid callback request".to_string()))?;

    let url = url::Url::parse(&format!("http://localhost{}", path))
        .map_err(|e| AuthError::AuthorizationFailed(format!("Invalid callback URL: {}", e)))?;

    let mut code = None;
    let mut state = None;

    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.to_string()),
            "state" => state = Some(value.to_string()),
            "error" => {
                let description = url
                    .query_pairs()
                    .find(|(k, _)| k == "error_description")
                    .map(|(_, v)| v.to_string())
                    .unwrap_or_else(|| value.to_string());
                return Err(AuthError::AuthorizationFailed(description));
            }
            _ => {}
        }
    }

    match (code, state) {
        (Some(c), Some(s)) => Ok((c, s)),
        _ => Err(AuthError::AuthorizationFailed(
            "Missing code or state in callback".to_string(),
        )),
    }
}

async fn send_http_response(stream: &mut TcpStream, status: &str, title: &str, message: &str) {
    let body = format!(
        "<!DOCTYPE html>\n<html><head><title>{title} - mailsheet</title></head>\
         <body><h1>{title}</h1><p>{message}</p></body></html>"
    );
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );

    if let Err(e) = stream.write_all(response.as_bytes()).await {
        warn!("Failed to answer OAuth2 callback: {}", e);
    }
    let _ = stream.flush().await;
}

/// Absolute expiry for a token lifetime; `None` when it is out of range
fn expiry_after(
    now: chrono::DateTime<chrono::Utc>,
    lifetime: std::time::Duration,
) -> Option<chrono::DateTime<chrono::Utc>> {
    let lifetime = chrono::Duration::from_std(lifetime).ok()?;
    let expiry = now.checked_add_signed(lifetime);
    if expiry.is_none() {
        warn!("Token lifetime of {}s is out of range, treating as no expiry", lifetime.num_seconds());
    }
    expiry
}
