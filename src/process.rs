//! One-shot entry points.
//!
//! [`process`] is the library equivalent of filling in the form once: resolve
//! the input, select it, invoke, and hand back the text. Callers that need to
//! keep a document selected across several prompts, or watch state changes,
//! should drive a [`Pipeline`] directly.

use crate::config::PipelineConfig;
use crate::credential::Credential;
use crate::document::{DocumentKind, DocumentSource};
use crate::error::DocPromptError;
use crate::pipeline::flatten::sheet_names;
use crate::pipeline::input;
use crate::pipeline::validate::classify;
use crate::session::Pipeline;
use serde::Serialize;
use std::time::Instant;
use tracing::info;

/// Result of one successful [`process`] call.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationOutput {
    /// Generated text, exactly as returned by the model.
    pub text: String,
    pub document_name: String,
    pub mime_type: String,
    pub kind: DocumentKind,
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub duration_ms: u64,
}

/// What [`inspect`] learns about an input without contacting the model.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentInfo {
    pub name: String,
    pub mime_type: String,
    /// `None` when the MIME type is not accepted.
    pub kind: Option<DocumentKind>,
    pub size_bytes: u64,
    /// Sheet names in declared order; empty for non-spreadsheets.
    pub sheet_names: Vec<String>,
}

/// Ask the configured model `instruction` about the document at `input`.
///
/// # Arguments
/// * `input` — local file path or HTTP/HTTPS URL
/// * `instruction` — the user's prompt, sent verbatim
/// * `credential` — API key, dropped when this call returns
///
/// # Errors
/// Any [`DocPromptError`]; use [`DocPromptError::user_notice`] for the text
/// to show a user.
pub async fn process(
    input: impl AsRef<str>,
    instruction: &str,
    credential: impl Into<Credential>,
    config: &PipelineConfig,
) -> Result<GenerationOutput, DocPromptError> {
    let start = Instant::now();
    let input = input.as_ref();
    info!("Starting processing: {}", input);

    let doc = input::resolve_input(
        input,
        config.download_timeout_secs,
        config.max_document_bytes,
    )
    .await?;
    let document_name = doc.name().to_string();
    let mime_type = doc.mime_type().to_string();

    let mut pipeline = Pipeline::new(config)?;
    let kind = pipeline.select(doc)?;
    let response = pipeline.invoke(credential.into(), instruction).await?;

    Ok(GenerationOutput {
        text: response.text,
        document_name,
        mime_type,
        kind,
        input_tokens: response.input_tokens,
        output_tokens: response.output_tokens,
        duration_ms: start.elapsed().as_millis() as u64,
    })
}

/// Synchronous wrapper around [`process`] for callers without a runtime.
pub fn process_sync(
    input: impl AsRef<str>,
    instruction: &str,
    credential: impl Into<Credential>,
    config: &PipelineConfig,
) -> Result<GenerationOutput, DocPromptError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| DocPromptError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(process(input, instruction, credential, config))
}

/// Resolve and classify an input without a credential.
///
/// Unsupported types are reported through `kind: None` rather than an error.
/// Spreadsheets are opened to list their sheets, so a corrupt workbook fails
/// here with [`DocPromptError::Parse`].
pub async fn inspect(
    input: impl AsRef<str>,
    config: &PipelineConfig,
) -> Result<DocumentInfo, DocPromptError> {
    let doc = input::resolve_input(
        input.as_ref(),
        config.download_timeout_secs,
        config.max_document_bytes,
    )
    .await?;
    let kind = classify(doc.mime_type());

    let size_bytes = match doc.source() {
        DocumentSource::Bytes(bytes) => bytes.len() as u64,
        DocumentSource::Path(path) => tokio::fs::metadata(path)
            .await
            .map_err(|e| DocPromptError::Read {
                name: doc.name().to_string(),
                detail: e.to_string(),
            })?
            .len(),
    };

    let sheet_names = if kind == Some(DocumentKind::Spreadsheet) {
        let bytes = doc.read_bytes(config.max_document_bytes).await?;
        sheet_names(doc.name(), &bytes)?
    } else {
        Vec::new()
    };

    Ok(DocumentInfo {
        name: doc.name().to_string(),
        mime_type: doc.mime_type().to_string(),
        kind,
        size_bytes,
        sheet_names,
    })
}
