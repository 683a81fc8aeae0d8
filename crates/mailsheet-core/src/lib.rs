//! Core pipeline for mailsheet
//!
//! Scans the first page of a mailbox for messages with a given subject and
//! stores their spreadsheet attachments in a local directory.

mod config;
mod error;
mod extractor;
mod filter;
mod pipeline;
mod scanner;
mod session;
mod sink;

pub use config::ExtractorConfig;
pub use error::{CoreError, CoreResult, SinkError};
pub use extractor::{Attachment, AttachmentExtractor};
pub use filter::{AttachmentFilter, SPREADSHEET_MIME};
pub use pipeline::{run_scan, SavedAttachment, ScanEntry, ScanEvent, ScanReport, SkippedAttachment};
pub use scanner::{subject_matches, MessageScanner, ScannedMessage};
pub use session::{acquire_credential, connect};
pub use sink::Sink;
