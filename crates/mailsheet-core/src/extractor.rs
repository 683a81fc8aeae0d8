//! Attachment discovery and download for a single message

use crate::CoreResult;
use futures::stream::{self, Stream};
use mailsheet_gmail::{decode_web_safe, GmailError, MailApi, Message, MessageDetail, Part};
use tracing::debug;

/// A decoded attachment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

pub struct AttachmentExtractor<'a, A> {
    api: &'a A,
    user_id: &'a str,
}

impl<'a, A: MailApi> AttachmentExtractor<'a, A> {
    pub fn new(api: &'a A, user_id: &'a str) -> Self {
        Self { api, user_id }
    }

    /// Fetch the full MIME tree of `message`
    pub async fn fetch(&self, message: &Message) -> CoreResult<MessageDetail> {
        Ok(self.api.get_message(self.user_id, &message.id).await?)
    }

    /// Lazily download every named part of `detail`.
    ///
    /// Parts are visited depth-first in provider order; parts without a
    /// filename are inline bodies and never yielded. Each poll performs at
    /// most one attachment request.
    pub fn extract(&self, detail: MessageDetail) -> impl Stream<Item = CoreResult<Attachment>> + 'a {
        let pending: Vec<Part> = detail
            .payload
            .attachment_parts()
            .into_iter()
            .cloned()
            .collect();
        debug!("Message {} has {} named parts", detail.id, pending.len());

        let cursor = PartCursor {
            api: self.api,
            user_id: self.user_id,
            message_id: detail.id,
            pending: pending.into_iter(),
        };

        stream::unfold(cursor, |mut cursor| async move {
            let Some(part) = cursor.pending.next() else {
                return None;
            };
            let item = cursor.download(part).await;
            Some((item, cursor))
        })
    }
}

struct PartCursor<'a, A> {
    api: &'a A,
    user_id: &'a str,
    message_id: String,
    pending: std::vec::IntoIter<Part>,
}

impl<A: MailApi> PartCursor<'_, A> {
    async fn download(&self, part: Part) -> CoreResult<Attachment> {
        let encoded = match (&part.body.attachment_id, part.body.data) {
            (Some(attachment_id), _) => {
                self.api
                    .get_attachment(self.user_id, &self.message_id, attachment_id)
                    .await?
                    .data
            }
            (None, Some(inline)) => inline,
            (None, None) => {
                return Err(GmailError::ParseError(format!(
                    "part {:?} of message {} has neither attachmentId nor data",
                    part.filename, self.message_id
                ))
                .into())
            }
        };

        let data = decode_web_safe(&encoded)?;
        debug!("Decoded {} ({} bytes)", part.filename, data.len());

        Ok(Attachment {
            filename: part.filename,
            mime_type: part.mime_type,
            data,
        })
    }
}
