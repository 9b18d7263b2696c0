//! The document a user has picked for processing.

use crate::error::DocPromptError;
use serde::Serialize;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// MIME type of `.xlsx` workbooks, the only spreadsheet format accepted.
pub const SPREADSHEET_MIME: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// MIME type of PDF documents.
pub const PDF_MIME: &str = "application/pdf";

/// Accepted document families. Each maps to one encoding strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Pdf,
    Image,
    Spreadsheet,
}

/// Where the document bytes live.
///
/// Paths are read lazily at encode time, so a file that disappears or
/// becomes unreadable after selection surfaces as a read error during
/// processing rather than at selection. In-memory bytes are shared, so
/// cloning a document never copies its content.
#[derive(Debug, Clone)]
pub enum DocumentSource {
    Bytes(Arc<[u8]>),
    Path(PathBuf),
}

/// A user-selected document: byte source, declared MIME type and display name.
///
/// Never mutated after creation; a new selection replaces it wholesale.
#[derive(Debug, Clone)]
pub struct SelectedDocument {
    name: String,
    mime_type: String,
    source: DocumentSource,
}

impl SelectedDocument {
    /// An in-memory document with an explicitly declared MIME type.
    pub fn from_bytes(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            source: DocumentSource::Bytes(Arc::from(bytes.into())),
        }
    }

    /// A document backed by a local file; the MIME type is guessed from the
    /// extension (unknown extensions become `application/octet-stream`).
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let mime_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Self {
            name,
            mime_type,
            source: DocumentSource::Path(path.to_path_buf()),
        }
    }

    /// Override the declared MIME type.
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn source(&self) -> &DocumentSource {
        &self.source
    }

    /// Read the full byte content, refusing anything larger than `max_bytes`.
    pub async fn read_bytes(&self, max_bytes: u64) -> Result<Cow<'_, [u8]>, DocPromptError> {
        match &self.source {
            DocumentSource::Bytes(bytes) => {
                self.check_size(bytes.len() as u64, max_bytes)?;
                Ok(Cow::Borrowed(&bytes[..]))
            }
            DocumentSource::Path(path) => {
                let meta = tokio::fs::metadata(path).await.map_err(|e| self.read_error(e))?;
                self.check_size(meta.len(), max_bytes)?;

                let bytes = tokio::fs::read(path).await.map_err(|e| self.read_error(e))?;
                if (bytes.len() as u64) < meta.len() {
                    return Err(DocPromptError::Read {
                        name: self.name.clone(),
                        detail: format!(
                            "truncated read: got {} of {} bytes",
                            bytes.len(),
                            meta.len()
                        ),
                    });
                }
                debug!("Read {} bytes from {}", bytes.len(), path.display());
                Ok(Cow::Owned(bytes))
            }
        }
    }

    fn check_size(&self, len: u64, max_bytes: u64) -> Result<(), DocPromptError> {
        if len > max_bytes {
            return Err(DocPromptError::Read {
                name: self.name.clone(),
                detail: format!("{len} bytes exceeds the {max_bytes}-byte limit"),
            });
        }
        Ok(())
    }

    fn read_error(&self, e: std::io::Error) -> DocPromptError {
        DocPromptError::Read {
            name: self.name.clone(),
            detail: e.to_string(),
        }
    }
}
