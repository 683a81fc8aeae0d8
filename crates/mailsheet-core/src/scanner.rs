//! Message listing and subject matching

use crate::CoreResult;
use mailsheet_gmail::{MailApi, Message};
use tracing::{debug, info};

/// Case-insensitive exact subject match; a missing subject never matches
pub fn subject_matches(subject: Option<&str>, target: &str) -> bool {
    match subject {
        Some(subject) => subject.to_lowercase() == target.to_lowercase(),
        None => false,
    }
}

/// A listed message together with its resolved subject
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedMessage {
    pub message: Message,
    pub subject: Option<String>,
}

impl ScannedMessage {
    pub fn matches(&self, target: &str) -> bool {
        subject_matches(self.subject.as_deref(), target)
    }
}

pub struct MessageScanner<'a, A> {
    api: &'a A,
    user_id: &'a str,
    max_results: Option<u32>,
}

impl<'a, A: MailApi> MessageScanner<'a, A> {
    pub fn new(api: &'a A, user_id: &'a str, max_results: Option<u32>) -> Self {
        Self {
            api,
            user_id,
            max_results,
        }
    }

    /// The first listed page only. A `nextPageToken` is logged, not followed.
    pub async fn list_candidates(&self) -> CoreResult<Vec<Message>> {
        let list = self
            .api
            .list_messages(self.user_id, self.max_results)
            .await?;

        if list.next_page_token.is_some() {
            info!(
                "Scanning the first {} messages only; older messages are not listed",
                list.messages.len()
            );
        }
        Ok(list.messages)
    }

    /// Fetch the Subject header of one message
    pub async fn resolve(&self, message: Message) -> CoreResult<ScannedMessage> {
        let detail = self
            .api
            .get_message_metadata(self.user_id, &message.id, &["Subject"])
            .await?;
        let subject = detail.subject().map(str::to_string);

        debug!("Message {} has subject {:?}", message.id, subject);
        Ok(ScannedMessage { message, subject })
    }
}
