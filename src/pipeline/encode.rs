//! Encoding: `SelectedDocument` → request-ready [`EncodedPayload`].
//!
//! Two strategies, chosen through [`strategy_for`] by document kind:
//!
//! * **Binary** (PDF, images) — the raw bytes, base64 encoded, sent to the
//!   model as inline data under their original MIME type.
//! * **Tabular** (`.xlsx`) — Gemini does not read workbooks natively, so the
//!   sheets are flattened to a CSV transcript and sent as text.
//!
//! Each strategy reads the document once, produces the whole payload or
//! fails, and drops its buffers when the future completes.

use crate::document::{DocumentKind, SelectedDocument};
use crate::error::DocPromptError;
use crate::pipeline::flatten::flatten_workbook;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::debug;

/// The request-ready form of a document. Recomputed per invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodedPayload {
    /// Base64 bytes plus the MIME type they were declared with.
    Inline { data: String, mime_type: String },
    /// Flattened spreadsheet text.
    Transcript(String),
}

/// How a document kind is turned into a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeStrategy {
    Binary,
    Tabular,
}

/// Encoding strategy per accepted document kind.
///
/// Exhaustive over [`DocumentKind`]: a new kind does not compile until it is
/// given a strategy here.
pub const fn strategy_for(kind: DocumentKind) -> EncodeStrategy {
    match kind {
        DocumentKind::Pdf | DocumentKind::Image => EncodeStrategy::Binary,
        DocumentKind::Spreadsheet => EncodeStrategy::Tabular,
    }
}

/// Encode a validated document.
pub async fn encode(
    doc: &SelectedDocument,
    kind: DocumentKind,
    max_bytes: u64,
) -> Result<EncodedPayload, DocPromptError> {
    match strategy_for(kind) {
        EncodeStrategy::Binary => encode_binary(doc, max_bytes).await,
        EncodeStrategy::Tabular => encode_tabular(doc, max_bytes).await,
    }
}

async fn encode_binary(
    doc: &SelectedDocument,
    max_bytes: u64,
) -> Result<EncodedPayload, DocPromptError> {
    let bytes = doc.read_bytes(max_bytes).await?;
    let data = STANDARD.encode(&bytes);
    debug!("Encoded {} → {} bytes base64", doc.name(), data.len());

    Ok(EncodedPayload::Inline {
        data,
        mime_type: doc.mime_type().to_string(),
    })
}

async fn encode_tabular(
    doc: &SelectedDocument,
    max_bytes: u64,
) -> Result<EncodedPayload, DocPromptError> {
    let bytes = doc.read_bytes(max_bytes).await?.into_owned();
    let name = doc.name().to_string();

    // Zip inflation and XML parsing are CPU-bound. The transcript goes inline
    // in the request, so it shares the document size limit.
    let transcript =
        tokio::task::spawn_blocking(move || flatten_workbook(&name, &bytes, max_bytes))
        .await
        .map_err(|e| DocPromptError::Internal(format!("flatten task panicked: {e}")))??;

    debug!("Flattened {} → {} chars", doc.name(), transcript.len());
    Ok(EncodedPayload::Transcript(transcript))
}
