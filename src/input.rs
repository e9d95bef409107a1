//! The document being uploaded: name, bytes, and MIME type.
//!
//! The service decides what it can convert from the file name's extension,
//! so the name travels with the bytes. The MIME type is guessed from the same
//! extension and only serves as a hint on the multipart part.

use crate::error::ClientError;
use std::path::Path;
use tracing::debug;

const FALLBACK_FILE_NAME: &str = "document";

/// A file ready to be sent to `/convert`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFile {
    file_name: String,
    mime: String,
    bytes: Vec<u8>,
}

impl DocumentFile {
    /// Wrap in-memory content. The MIME type is guessed from `file_name`.
    pub fn from_bytes(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        let file_name = file_name.into();
        let mime = mime_guess::from_path(&file_name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Self {
            file_name,
            mime,
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk, keeping its final path component as the name.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| ClientError::FileRead {
                path: path.to_path_buf(),
                source,
            })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| FALLBACK_FILE_NAME.to_string());

        debug!("Read {} bytes from {}", bytes.len(), path.display());
        Ok(Self::from_bytes(file_name, bytes))
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
