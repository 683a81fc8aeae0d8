//! Shared test utilities for mailsheet-core integration tests.
//!
//! `FakeMailbox` stands in for the Gmail API and records every call made
//! against it.

#![allow(dead_code)]

use async_trait::async_trait;
use mailsheet_core::{ExtractorConfig, SPREADSHEET_MIME};
use mailsheet_gmail::{
    AttachmentBody, GmailError, GmailResult, Header, MailApi, Message, MessageDetail,
    MessageList, Part, PartBody, Payload,
};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

/// `PK\x03\x04`, web-safe base64 without padding
pub const XLSX_B64: &str = "UEsDBA";
pub const XLSX_BYTES: &[u8] = b"PK\x03\x04";
/// `\x89PNG`
pub const PNG_B64: &str = "iVBORw";

#[derive(Default)]
pub struct FakeMailbox {
    messages: Vec<MessageDetail>,
    attachments: HashMap<String, String>,
    next_page_token: Option<String>,
    failing_attachment: Option<(String, u16)>,
    calls: Mutex<Vec<String>>,
}

impl FakeMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_message(mut self, id: &str, subject: Option<&str>, parts: Vec<Part>) -> Self {
        let headers = subject
            .map(|s| {
                vec![Header {
                    name: "Subject".to_string(),
                    value: s.to_string(),
                }]
            })
            .unwrap_or_default();

        self.messages.push(MessageDetail {
            id: id.to_string(),
            thread_id: Some(id.to_string()),
            payload: Payload {
                mime_type: "multipart/mixed".to_string(),
                headers,
                body: PartBody::default(),
                parts,
            },
        });
        self
    }

    pub fn with_attachment(mut self, attachment_id: &str, data: &str) -> Self {
        self.attachments
            .insert(attachment_id.to_string(), data.to_string());
        self
    }

    pub fn with_next_page(mut self, token: &str) -> Self {
        self.next_page_token = Some(token.to_string());
        self
    }

    pub fn failing_attachment(mut self, attachment_id: &str, status: u16) -> Self {
        self.failing_attachment = Some((attachment_id.to_string(), status));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn find(&self, id: &str) -> GmailResult<&MessageDetail> {
        self.messages
            .iter()
            .find(|m| m.id == id)
            .ok_or_else(|| GmailError::ApiError {
                status: 404,
                body: format!("Requested entity was not found: {}", id),
            })
    }
}

#[async_trait]
impl MailApi for FakeMailbox {
    async fn list_messages(
        &self,
        user_id: &str,
        _max_results: Option<u32>,
    ) -> GmailResult<MessageList> {
        self.record(format!("list:{}", user_id));
        Ok(MessageList {
            messages: self
                .messages
                .iter()
                .map(|m| Message {
                    id: m.id.clone(),
                    thread_id: m.thread_id.clone(),
                })
                .collect(),
            next_page_token: self.next_page_token.clone(),
            result_size_estimate: Some(self.messages.len() as u32),
        })
    }

    async fn get_message(&self, _user_id: &str, id: &str) -> GmailResult<MessageDetail> {
        self.record(format!("get:{}", id));
        self.find(id).cloned()
    }

    async fn get_message_metadata(
        &self,
        _user_id: &str,
        id: &str,
        headers: &[&str],
    ) -> GmailResult<MessageDetail> {
        self.record(format!("metadata:{}", id));
        let full = self.find(id)?;
        Ok(MessageDetail {
            id: full.id.clone(),
            thread_id: full.thread_id.clone(),
            payload: Payload {
                headers: full
                    .payload
                    .headers
                    .iter()
                    .filter(|h| headers.iter().any(|n| h.name.eq_ignore_ascii_case(n)))
                    .cloned()
                    .collect(),
                ..Payload::default()
            },
        })
    }

    async fn get_attachment(
        &self,
        _user_id: &str,
        message_id: &str,
        attachment_id: &str,
    ) -> GmailResult<AttachmentBody> {
        self.record(format!("attachment:{}/{}", message_id, attachment_id));
        if let Some((failing, status)) = &self.failing_attachment {
            if failing == attachment_id {
                return Err(GmailError::ApiError {
                    status: *status,
                    body: "Rate Limit Exceeded".to_string(),
                });
            }
        }
        let data = self
            .attachments
            .get(attachment_id)
            .cloned()
            .ok_or_else(|| GmailError::ApiError {
                status: 404,
                body: format!("No attachment {}", attachment_id),
            })?;
        Ok(AttachmentBody {
            size: data.len() as u64,
            data,
        })
    }
}

/// Named part fetched by attachment id
pub fn attachment_part(filename: &str, mime_type: &str, attachment_id: &str) -> Part {
    Part {
        part_id: None,
        mime_type: mime_type.to_string(),
        filename: filename.to_string(),
        body: PartBody {
            attachment_id: Some(attachment_id.to_string()),
            size: 0,
            data: None,
        },
        parts: Vec::new(),
    }
}

/// Unnamed inline body
pub fn inline_part(mime_type: &str, data: &str) -> Part {
    Part {
        part_id: None,
        mime_type: mime_type.to_string(),
        filename: String::new(),
        body: PartBody {
            attachment_id: None,
            size: data.len() as u64,
            data: Some(data.to_string()),
        },
        parts: Vec::new(),
    }
}

pub fn container_part(mime_type: &str, parts: Vec<Part>) -> Part {
    Part {
        part_id: None,
        mime_type: mime_type.to_string(),
        filename: String::new(),
        body: PartBody::default(),
        parts,
    }
}

pub fn spreadsheet(filename: &str, attachment_id: &str) -> Part {
    attachment_part(filename, SPREADSHEET_MIME, attachment_id)
}

pub fn config(store_dir: &Path) -> ExtractorConfig {
    ExtractorConfig {
        store_dir: store_dir.to_path_buf(),
        ..ExtractorConfig::default()
    }
}
