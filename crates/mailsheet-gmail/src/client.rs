use crate::api::MailApi;
use crate::error::{GmailError, GmailResult};
use crate::types::*;
use async_trait::async_trait;
use mailsheet_auth::Credential;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

const GMAIL_BASE: &str = "https://gmail.googleapis.com/gmail/v1";

pub struct GmailClient {
    client: reqwest::Client,
    access_token: String,
    base_url: String,
}

impl GmailClient {
    pub fn new(credential: &Credential) -> Self {
        Self {
            client: reqwest::Client::new(),
            access_token: credential.token.clone(),
            base_url: GMAIL_BASE.to_string(),
        }
    }

    /// Point the client at a different API root (no trailing slash)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Send a GET, map non-2xx to `ApiError` and decode the typed body
    async fn get_json<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> GmailResult<T> {
        let response = request.bearer_auth(&self.access_token).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GmailError::ApiError { status, body });
        }

        response
            .json()
            .await
            .map_err(|e| GmailError::ParseError(e.to_string()))
    }
}

#[async_trait]
impl MailApi for GmailClient {
    async fn list_messages(
        &self,
        user_id: &str,
        max_results: Option<u32>,
    ) -> GmailResult<MessageList> {
        let url = format!("{}/users/{}/messages", self.base_url, user_id);
        debug!("Gmail: listing messages user={} max_results={:?}", user_id, max_results);

        let mut request = self.client.get(&url);
        if let Some(max) = max_results {
            request = request.query(&[("maxResults", max)]);
        }

        let list: MessageList = self.get_json(request).await?;
        info!(
            "Gmail: got {} messages, has_more={}",
            list.messages.len(),
            list.next_page_token.is_some()
        );
        Ok(list)
    }

    async fn get_message(&self, user_id: &str, id: &str) -> GmailResult<MessageDetail> {
        let url = format!("{}/users/{}/messages/{}", self.base_url, user_id, id);
        debug!("Gmail: fetching message {}", id);

        self.get_json(self.client.get(&url).query(&[("format", "full")]))
            .await
    }

    async fn get_message_metadata(
        &self,
        user_id: &str,
        id: &str,
        headers: &[&str],
    ) -> GmailResult<MessageDetail> {
        let url = format!("{}/users/{}/messages/{}", self.base_url, user_id, id);
        debug!("Gmail: fetching metadata {:?} for {}", headers, id);

        let mut request = self.client.get(&url).query(&[("format", "metadata")]);
        for header in headers {
            request = request.query(&[("metadataHeaders", header)]);
        }

        self.get_json(request).await
    }

    async fn get_attachment(
        &self,
        user_id: &str,
        message_id: &str,
        attachment_id: &str,
    ) -> GmailResult<AttachmentBody> {
        let url = format!(
            "{}/users/{}/messages/{}/attachments/{}",
            self.base_url, user_id, message_id, attachment_id
        );
        debug!("Gmail: fetching attachment {} of {}", attachment_id, message_id);

        let attachment: AttachmentBody = self.get_json(self.client.get(&url)).await?;
        debug!("Gmail: attachment {} is {} bytes", attachment_id, attachment.size);
        Ok(attachment)
    }
}
