//! Spreadsheet acceptance rules

use crate::extractor::Attachment;
use std::fmt;
use std::str::FromStr;

/// Content type of an Office Open XML workbook (`.xlsx`)
pub const SPREADSHEET_MIME: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Decides which extracted attachments get stored.
///
/// Exactly one strategy is active; the two are never combined, since a
/// renamed file or a mislabeled content type makes them disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentFilter {
    /// Exact match on the part's MIME type
    MimeType(String),
    /// Case-sensitive filename suffix match
    Extension(String),
}

impl Default for AttachmentFilter {
    fn default() -> Self {
        AttachmentFilter::MimeType(SPREADSHEET_MIME.to_string())
    }
}

impl AttachmentFilter {
    pub fn accepts(&self, attachment: &Attachment) -> bool {
        match self {
            AttachmentFilter::MimeType(mime) => attachment.mime_type == *mime,
            AttachmentFilter::Extension(suffix) => attachment.filename.ends_with(suffix.as_str()),
        }
    }
}

impl fmt::Display for AttachmentFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttachmentFilter::MimeType(mime) => write!(f, "mime:{}", mime),
            AttachmentFilter::Extension(suffix) => write!(f, "ext:{}", suffix),
        }
    }
}

/// Parses `mime:<type>` or `ext:<suffix>`
impl FromStr for AttachmentFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some(("mime", mime)) if !mime.is_empty() => {
                Ok(AttachmentFilter::MimeType(mime.to_string()))
            }
            Some(("ext", suffix)) if !suffix.is_empty() => {
                Ok(AttachmentFilter::Extension(suffix.to_string()))
            }
            _ => Err(format!(
                "expected 'mime:<type>' or 'ext:<suffix>', got {:?}",
                s
            )),
        }
    }
}
