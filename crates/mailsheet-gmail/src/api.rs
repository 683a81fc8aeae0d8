//! Seam between the extraction pipeline and the Gmail transport

use crate::{AttachmentBody, GmailResult, MessageDetail, MessageList};
use async_trait::async_trait;

/// The subset of the Gmail API the pipeline consumes
#[async_trait]
pub trait MailApi: Send + Sync {
    /// First page of `users.messages.list`
    async fn list_messages(&self, user_id: &str, max_results: Option<u32>)
        -> GmailResult<MessageList>;

    /// Full message including the MIME part tree
    async fn get_message(&self, user_id: &str, id: &str) -> GmailResult<MessageDetail>;

    /// Message with only the named headers populated
    async fn get_message_metadata(
        &self,
        user_id: &str,
        id: &str,
        headers: &[&str],
    ) -> GmailResult<MessageDetail>;

    async fn get_attachment(
        &self,
        user_id: &str,
        message_id: &str,
        attachment_id: &str,
    ) -> GmailResult<AttachmentBody>;
}
