//! Local storage for accepted attachments

use crate::extractor::Attachment;
use crate::SinkError;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Writes attachments into a single flat directory
pub struct Sink {
    store_dir: PathBuf,
}

impl Sink {
    pub fn new(store_dir: impl Into<PathBuf>) -> Self {
        Self {
            store_dir: store_dir.into(),
        }
    }

    pub fn store_dir(&self) -> &Path {
        &self.store_dir
    }

    /// Create the store directory if it does not exist yet
    pub fn prepare(&self) -> Result<(), SinkError> {
        if self.store_dir.is_dir() {
            return Ok(());
        }
        // create_dir_all tolerates the directory appearing concurrently
        std::fs::create_dir_all(&self.store_dir).map_err(|e| SinkError::CreateDirectory {
            path: self.store_dir.clone(),
            source: e,
        })?;
        info!("Created store directory {}", self.store_dir.display());
        Ok(())
    }

    /// Write `attachment` as `<store_dir>/<filename>`, replacing any
    /// existing file of that name.
    ///
    /// Bytes go to a short-named temporary file in the store directory and
    /// are persisted into place, so an interrupted write never leaves a
    /// truncated file under the final name.
    pub fn store(&self, attachment: &Attachment) -> Result<PathBuf, SinkError> {
        let filename = plain_filename(&attachment.filename)?;
        self.prepare()?;

        let path = self.store_dir.join(filename);
        let write_err = |source| SinkError::WriteFile {
            path: path.clone(),
            source,
        };

        let mut partial = NamedTempFile::new_in(&self.store_dir).map_err(write_err)?;
        partial.write_all(&attachment.data).map_err(write_err)?;
        partial.as_file().sync_all().map_err(write_err)?;
        // a failed persist drops the temporary file, which removes it
        partial.persist(&path).map_err(|e| write_err(e.error))?;

        debug!("Wrote {} bytes to {}", attachment.data.len(), path.display());
        Ok(path)
    }
}

/// Accept only a single normal path component
fn plain_filename(name: &str) -> Result<&str, SinkError> {
    let invalid = || SinkError::InvalidFilename(name.to_string());

    if name.contains(['/', '\\']) {
        return Err(invalid());
    }
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(name),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attachment(filename: &str, data: &[u8]) -> Attachment {
        Attachment {
            filename: filename.to_string(),
            mime_type: crate::SPREADSHEET_MIME.to_string(),
            data: data.to_vec(),
        }
    }

    #[test]
    fn test_prepare_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let sink = Sink::new(dir.path().join("downloaded_attachments"));

        sink.prepare().unwrap();
        assert!(sink.store_dir().is_dir());
        sink.prepare().unwrap();
    }

    #[test]
    fn test_store_creates_directory_and_writes_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let sink = Sink::new(dir.path().join("out"));

        let path = sink.store(&attachment("report.xlsx", b"PK\x03\x04")).unwrap();

        assert_eq!(path, dir.path().join("out").join("report.xlsx"));
        assert_eq!(std::fs::read(&path).unwrap(), b"PK\x03\x04");
        let entries = std::fs::read_dir(dir.path().join("out")).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_stores_name_at_filesystem_limit() {
        let dir = tempfile::tempdir().unwrap();
        let sink = Sink::new(dir.path().join("out"));
        let name = format!("{}.xlsx", "a".repeat(250));
        assert_eq!(name.len(), 255);

        let path = sink.store(&attachment(&name, b"PK\x03\x04")).unwrap();

        assert_eq!(path.file_name().unwrap().len(), 255);
        assert_eq!(std::fs::read(&path).unwrap(), b"PK\x03\x04");
        let entries = std::fs::read_dir(dir.path().join("out")).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_last_write_wins() {
        let dir = tempfile::tempdir().unwrap();
        let sink = Sink::new(dir.path());

        sink.store(&attachment("report.xlsx", b"first")).unwrap();
        let path = sink.store(&attachment("report.xlsx", b"second")).unwrap();

        assert_eq!(std::fs::read(path).unwrap(), b"second");
    }

    #[test]
    fn test_rejects_unsafe_names() {
        let dir = tempfile::tempdir().unwrap();
        let sink = Sink::new(dir.path().join("out"));

        for name in ["", ".", "..", "../escape.xlsx", "a/b.xlsx", "a\\b.xlsx", "/etc/passwd"] {
            let err = sink.store(&attachment(name, b"x")).unwrap_err();
            assert!(matches!(err, SinkError::InvalidFilename(_)), "{name:?}");
        }
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn test_unwritable_directory_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"").unwrap();
        let sink = Sink::new(blocker.join("sub"));

        let err = sink.store(&attachment("report.xlsx", b"x")).unwrap_err();
        assert!(matches!(err, SinkError::CreateDirectory { .. }));
    }
}
