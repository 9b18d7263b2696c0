//! Error types for the docprompt library.
//!
//! A single [`DocPromptError`] covers every failure, but failures fall into
//! two very different groups:
//!
//! * **Validation** — the selected file is not an accepted type. This is
//!   recovered locally: the user is told the file type is unsupported and the
//!   pipeline keeps whatever it had before.
//!
//! * **Processing** — reading, parsing, downloading or the remote call failed.
//!   All of these reach the user as the same [`GENERIC_FAILURE_NOTICE`]; the
//!   precise variant is only kept for the diagnostic trace and for library
//!   callers that want to branch on it.

use std::path::PathBuf;
use thiserror::Error;

/// The one message shown to users for any non-validation failure.
pub const GENERIC_FAILURE_NOTICE: &str =
    "An error occurred while processing the document. Please check your API key and try again.";

/// The message shown when a selected file is outside the allow-list.
pub const UNSUPPORTED_FILE_NOTICE: &str =
    "Unsupported file type. Please select a PDF, an image or an Excel (.xlsx) spreadsheet.";

/// All errors returned by the docprompt library.
#[derive(Debug, Error)]
pub enum DocPromptError {
    // ── Validation errors ─────────────────────────────────────────────────
    /// The declared MIME type is not in the allow-list.
    #[error("Unsupported file type '{mime_type}' for '{name}'")]
    UnsupportedFileType { name: String, mime_type: String },

    /// A required input (document, instruction or credential) is missing.
    ///
    /// Returned before any request is built; the pipeline state is untouched.
    #[error("Missing required input: {field}")]
    MissingInput { field: &'static str },

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The document bytes could not be read (I/O failure, truncation, too large).
    #[error("Failed to read '{name}': {detail}")]
    Read { name: String, detail: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    // ── Encoding errors ───────────────────────────────────────────────────
    /// The bytes are not a valid workbook container.
    #[error("Spreadsheet '{name}' could not be parsed: {detail}")]
    Parse { name: String, detail: String },

    // ── Remote errors ─────────────────────────────────────────────────────
    /// The generation endpoint rejected the call or returned an unusable response.
    ///
    /// `status` is the HTTP status when one was received; `None` for
    /// transport failures and malformed bodies.
    #[error("Generation request failed{}: {detail}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Remote { status: Option<u16>, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DocPromptError {
    /// True for errors that are recovered locally without touching the pipeline.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            DocPromptError::UnsupportedFileType { .. } | DocPromptError::MissingInput { .. }
        )
    }

    /// The message a user should see for this error.
    ///
    /// Processing failures are deliberately undifferentiated.
    pub fn user_notice(&self) -> String {
        match self {
            DocPromptError::UnsupportedFileType { .. } => UNSUPPORTED_FILE_NOTICE.to_string(),
            DocPromptError::MissingInput { field } => {
                format!("Please provide {field} before processing.")
            }
            _ => GENERIC_FAILURE_NOTICE.to_string(),
        }
    }
}
