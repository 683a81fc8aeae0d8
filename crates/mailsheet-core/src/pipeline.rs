//! One bounded scan: list, match, extract, filter, store

use crate::extractor::AttachmentExtractor;
use crate::scanner::MessageScanner;
use crate::sink::Sink;
use crate::{CoreResult, ExtractorConfig};
use futures::StreamExt;
use mailsheet_gmail::MailApi;
use std::fmt;
use std::path::PathBuf;
use tracing::{info, warn};

/// Progress notifications emitted while a scan runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    /// Scan started
    SearchStarted { subject: String },
    /// Visual break between phases
    Separator,
    /// The listing was empty
    NoMessages,
    /// A message subject matched the target
    SubjectMatched { subject: String },
    /// A matched message had no named parts
    NoAttachments,
    /// Attachment passed the filter
    AttachmentFound { filename: String, mime_type: String },
    /// Attachment rejected by the filter
    AttachmentSkipped { filename: String, mime_type: String },
    /// Attachment written to disk
    AttachmentSaved { path: PathBuf },
}

impl fmt::Display for ScanEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanEvent::SearchStarted { subject } => write!(
                f,
                "Searching for messages with subject: '{}' and extracting excel attachments",
                subject
            ),
            ScanEvent::Separator => write!(f, "{}", "-".repeat(20)),
            ScanEvent::NoMessages => write!(f, "No messages found."),
            ScanEvent::SubjectMatched { subject } => write!(f, "Subject: {} found!", subject),
            ScanEvent::NoAttachments => write!(f, "No attachments found."),
            ScanEvent::AttachmentFound {
                filename,
                mime_type,
            } => write!(f, "Found attachment: name: {}, mimeType: {}", filename, mime_type),
            ScanEvent::AttachmentSkipped {
                filename,
                mime_type,
            } => write!(f, "Skipping attachment: {} of type: {}", filename, mime_type),
            ScanEvent::AttachmentSaved { path } => write!(f, "Saved to {}", path.display()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedAttachment {
    pub filename: String,
    pub mime_type: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedAttachment {
    pub filename: String,
    pub mime_type: String,
}

/// Outcome for one listed message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanEntry {
    pub message_id: String,
    pub subject: Option<String>,
    pub matched: bool,
    pub saved: Vec<SavedAttachment>,
    pub skipped: Vec<SkippedAttachment>,
}

/// Per-message outcomes in listing order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    pub entries: Vec<ScanEntry>,
}

impl ScanReport {
    pub fn matched(&self) -> impl Iterator<Item = &ScanEntry> {
        self.entries.iter().filter(|e| e.matched)
    }

    pub fn saved_count(&self) -> usize {
        self.entries.iter().map(|e| e.saved.len()).sum()
    }
}

/// Scan the first page of the mailbox and store matching spreadsheets.
///
/// Every failure ends the scan; nothing is retried.
pub async fn run_scan<A, F>(config: &ExtractorConfig, api: &A, mut on_event: F) -> CoreResult<ScanReport>
where
    A: MailApi,
    F: FnMut(&ScanEvent),
{
    let scanner = MessageScanner::new(api, &config.user_id, config.max_results);
    let extractor = AttachmentExtractor::new(api, &config.user_id);
    let sink = Sink::new(&config.store_dir);
    let mut report = ScanReport::default();

    info!(
        "Scanning for subject {:?} with filter {}",
        config.target_subject, config.filter
    );
    on_event(&ScanEvent::SearchStarted {
        subject: config.target_subject.clone(),
    });
    on_event(&ScanEvent::Separator);

    let messages = scanner.list_candidates().await?;
    if messages.is_empty() {
        on_event(&ScanEvent::NoMessages);
        return Ok(report);
    }

    sink.prepare()?;

    for message in messages {
        let scanned = scanner.resolve(message).await?;
        let mut entry = ScanEntry {
            message_id: scanned.message.id.clone(),
            subject: scanned.subject.clone(),
            matched: scanned.matches(&config.target_subject),
            saved: Vec::new(),
            skipped: Vec::new(),
        };

        if !entry.matched {
            report.entries.push(entry);
            continue;
        }

        info!("Message {} matched", entry.message_id);
        on_event(&ScanEvent::SubjectMatched {
            subject: entry.subject.clone().unwrap_or_default(),
        });

        let detail = extractor.fetch(&scanned.message).await?;
        let mut attachments = std::pin::pin!(extractor.extract(detail));
        let mut seen = 0usize;

        while let Some(attachment) = attachments.next().await {
            let attachment = attachment?;
            seen += 1;

            if config.filter.accepts(&attachment) {
                on_event(&ScanEvent::AttachmentFound {
                    filename: attachment.filename.clone(),
                    mime_type: attachment.mime_type.clone(),
                });
                let path = sink.store(&attachment)?;
                on_event(&ScanEvent::AttachmentSaved { path: path.clone() });
                entry.saved.push(SavedAttachment {
                    filename: attachment.filename,
                    mime_type: attachment.mime_type,
                    path,
                });
            } else {
                warn!(
                    "Skipping {} ({}) in message {}",
                    attachment.filename, attachment.mime_type, entry.message_id
                );
                on_event(&ScanEvent::AttachmentSkipped {
                    filename: attachment.filename.clone(),
                    mime_type: attachment.mime_type.clone(),
                });
                entry.skipped.push(SkippedAttachment {
                    filename: attachment.filename,
                    mime_type: attachment.mime_type,
                });
            }
        }

        if seen == 0 {
            on_event(&ScanEvent::NoAttachments);
        } else {
            on_event(&ScanEvent::Separator);
        }
        report.entries.push(entry);
    }

    info!(
        "Scan finished: {} messages, {} matched, {} attachments saved",
        report.entries.len(),
        report.matched().count(),
        report.saved_count()
    );
    Ok(report)
}
