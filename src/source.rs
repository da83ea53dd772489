//! Raw document acquisition and content hashing.

use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// Immutable input to one extraction run: the raw bytes plus whatever the
/// uploader declared about them. Never mutated after construction.
#[derive(Debug, Clone)]
pub struct RawDocument {
    /// Raw file bytes.
    pub data: Vec<u8>,
    /// Original filename, if declared.
    pub filename: Option<String>,
    /// Declared MIME type, if any.
    pub mime: Option<String>,
    /// SHA-256 of `data`, hex encoded.
    pub digest: String,
}

impl RawDocument {
    /// Wrap an uploaded byte buffer.
    ///
    /// An empty buffer is the one unrecoverable input and fails with
    /// [`Error::Unreadable`].
    pub fn from_bytes(
        data: Vec<u8>,
        filename: Option<String>,
        mime: Option<String>,
    ) -> Result<Self> {
        if data.is_empty() {
            return Err(Error::Unreadable("empty buffer".to_string()));
        }
        let digest = content_digest(&data);
        Ok(Self {
            data,
            filename,
            mime,
            digest,
        })
    }

    /// Read a document from disk, taking the filename from the path.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned());
        Self::from_bytes(data, filename, None)
    }

    /// Size of the raw buffer in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// SHA-256 content digest, hex encoded. The cache and dedup key for an
/// uploaded artifact.
pub fn content_digest(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
