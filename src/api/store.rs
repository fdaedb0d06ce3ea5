//! Purpose: Persist decoded attachments under a designated directory.
//! Exports: `StoreConfig`, `AttachmentStore`, `StoredAttachment`.
//! Role: File-persistence collaborator for upload handlers; the decoders never touch disk.
//! Invariants: Each attachment is written in full to a newly created file; existing files are
//! never overwritten.
//! Invariants: The file handle is closed on every exit path, including write failures.
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::core::error::{Error, ErrorKind};
use crate::core::media;
use crate::core::multipart::DecodedAttachment;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StoreConfig {
    pub dir: PathBuf,
    pub url_prefix: String,
}

impl StoreConfig {
    pub fn new(dir: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            url_prefix: url_prefix.into(),
        }
    }

    /// Lecture videos: `<root>/videos`, served from `/videos/`.
    pub fn videos(root: &Path) -> Self {
        Self::new(root.join("videos"), "/videos/")
    }

    /// Study materials: `<root>/materials`, served from `/files/`.
    pub fn materials(root: &Path) -> Self {
        Self::new(root.join("materials"), "/files/")
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StoredAttachment {
    pub path: PathBuf,
    pub public_url: String,
    pub file_type: String,
    pub size_label: String,
    pub len: u64,
}

#[derive(Clone, Debug)]
pub struct AttachmentStore {
    config: StoreConfig,
}

impl AttachmentStore {
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn persist(&self, attachment: &DecodedAttachment) -> Result<StoredAttachment, Error> {
        let name = attachment.storage_filename.as_str();
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            return Err(Error::new(ErrorKind::Usage)
                .with_message("storage filename is not a plain file name")
                .with_field(attachment.field_name.clone()));
        }

        fs::create_dir_all(&self.config.dir).map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to create upload directory")
                .with_path(&self.config.dir)
                .with_source(err)
        })?;

        let path = self.config.dir.join(name);
        write_new_file(&path, &attachment.bytes)?;

        let len = attachment.bytes.len() as u64;
        let stored = StoredAttachment {
            public_url: format!("{}{}", self.config.url_prefix, name),
            file_type: media::file_type_label(&attachment.original_filename),
            size_label: media::format_file_size(len),
            len,
            path,
        };
        tracing::info!(
            path = %stored.path.display(),
            len,
            field = %attachment.field_name,
            "stored attachment"
        );
        Ok(stored)
    }
}

fn write_new_file(path: &Path, bytes: &[u8]) -> Result<(), Error> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|err| {
            let kind = if err.kind() == io::ErrorKind::AlreadyExists {
                ErrorKind::AlreadyExists
            } else {
                ErrorKind::Io
            };
            Error::new(kind)
                .with_message("failed to create attachment file")
                .with_path(path)
                .with_source(err)
        })?;

    let written = file.write_all(bytes).and_then(|()| file.flush());
    drop(file);
    if let Err(err) = written {
        // Do not leave a truncated upload behind.
        let _ = fs::remove_file(path);
        return Err(Error::new(ErrorKind::Io)
            .with_message("failed to write attachment file")
            .with_path(path)
            .with_source(err));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{AttachmentStore, StoreConfig};
    use crate::core::error::ErrorKind;
    use crate::core::multipart::DecodedAttachment;
    use bytes::Bytes;

    fn attachment(storage_filename: &str, data: &'static [u8]) -> DecodedAttachment {
        DecodedAttachment {
            field_name: "materialFile".to_string(),
            original_filename: "notes.pdf".to_string(),
            storage_filename: storage_filename.to_string(),
            content_type: "application/pdf".to_string(),
            bytes: Bytes::from_static(data),
        }
    }

    #[test]
    fn persists_bytes_and_reports_public_url() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = AttachmentStore::new(StoreConfig::materials(temp.path()));
        let stored = store
            .persist(&attachment("1700000000000_abcd1234.pdf", b"%PDF-1.4"))
            .expect("persist");
        assert_eq!(stored.public_url, "/files/1700000000000_abcd1234.pdf");
        assert_eq!(stored.file_type, "PDF");
        assert_eq!(stored.size_label, "8 B");
        assert_eq!(std::fs::read(&stored.path).expect("read"), b"%PDF-1.4");
    }

    #[test]
    fn never_overwrites_existing_files() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = AttachmentStore::new(StoreConfig::videos(temp.path()));
        store.persist(&attachment("clip.mp4", b"first")).expect("first");
        let err = store.persist(&attachment("clip.mp4", b"second")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        let on_disk = std::fs::read(temp.path().join("videos").join("clip.mp4")).expect("read");
        assert_eq!(on_disk, b"first");
    }

    #[test]
    fn rejects_path_like_storage_names() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = AttachmentStore::new(StoreConfig::videos(temp.path()));
        for name in ["../escape.mp4", "a/b.mp4", ".hidden", ""] {
            let err = store.persist(&attachment(name, b"x")).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Usage, "name {name:?}");
        }
    }
}
