//! Authentication module for mailsheet
//!
//! Keeps a Gmail API credential usable across runs:
//! 1. A persisted token file is reused while it is valid
//! 2. An expired token with a refresh token is refreshed in place
//! 3. Anything else goes through the browser-based installed-app flow

mod client_secret;
mod credential;
mod error;
mod flow;
mod store;

pub use client_secret::ClientSecret;
pub use credential::{Credential, CredentialFile, CredentialState};
pub use error::{AuthError, AuthResult};
pub use flow::{DesktopAuthorizer, InstalledAppFlow};
pub use store::{Authorizer, CredentialStore};

/// Gmail OAuth2 endpoints and scopes
pub mod gmail {
    /// Read-only mailbox access
    pub const READONLY_SCOPE: &str = "https://www.googleapis.com/auth/gmail.readonly";

    pub const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
    pub const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
}
