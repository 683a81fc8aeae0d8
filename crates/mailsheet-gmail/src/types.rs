use serde::Deserialize;

/// Response of `users.messages.list`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageList {
    /// Absent when the mailbox is empty
    #[serde(default)]
    pub messages: Vec<Message>,
    pub next_page_token: Option<String>,
    pub result_size_estimate: Option<u32>,
}

/// A message stub as returned by the listing (no headers, no body)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub thread_id: Option<String>,
}

/// A fetched message with its MIME tree
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDetail {
    pub id: String,
    pub thread_id: Option<String>,
    pub payload: Payload,
}

/// Root of the MIME tree
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payload {
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub headers: Vec<Header>,
    #[serde(default)]
    pub body: PartBody,
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// A MIME sub-part; an empty `filename` marks inline content
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    pub part_id: Option<String>,
    #[serde(default)]
    pub mime_type: String,
    pub filename: String,
    #[serde(default)]
    pub body: PartBody,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartBody {
    /// Reference for `users.messages.attachments.get`
    pub attachment_id: Option<String>,
    #[serde(default)]
    pub size: u64,
    /// Inline base64url data, present for small bodies
    pub data: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

/// Response of `users.messages.attachments.get`
#[derive(Debug, Clone, Deserialize)]
pub struct AttachmentBody {
    #[serde(default)]
    pub size: u64,
    /// base64url payload
    pub data: String,
}

impl MessageDetail {
    /// Value of the first header named `name` (ASCII case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.payload
            .headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    pub fn subject(&self) -> Option<&str> {
        self.header("Subject")
    }
}

impl Payload {
    /// Parts carrying a filename, depth-first in provider order
    pub fn attachment_parts(&self) -> Vec<&Part> {
        let mut found = Vec::new();
        for part in &self.parts {
            part.collect_attachments(&mut found);
        }
        found
    }
}

impl Part {
    pub fn is_attachment(&self) -> bool {
        !self.filename.is_empty()
    }

    fn collect_attachments<'a>(&'a self, found: &mut Vec<&'a Part>) {
        if self.is_attachment() {
            found.push(self);
        }
        for child in &self.parts {
            child.collect_attachments(found);
        }
    }
}
