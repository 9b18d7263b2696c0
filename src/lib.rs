//! # docprompt
//!
//! Ask a Gemini model a question about a document: a PDF, an image, or an
//! `.xlsx` spreadsheet.
//!
//! ## Pipeline Overview
//!
//! ```text
//! path / URL
//!  │
//!  ├─ 1. Input     resolve a local file or download a URL
//!  ├─ 2. Validate  accept image/*, application/pdf, .xlsx only
//!  ├─ 3. Encode    base64 inline data, or spreadsheet → CSV transcript
//!  ├─ 4. Request   [payload part, instruction part]
//!  └─ 5. Generate  one generateContent call → text
//! ```
//!
//! Every failure after validation reaches the user as one generic notice
//! ([`GENERIC_FAILURE_NOTICE`]); the typed [`DocPromptError`] is still
//! returned to library callers.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docprompt::{process, PipelineConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PipelineConfig::default();
//!     let key = std::env::var("GEMINI_API_KEY")?;
//!     let output = process("invoice.pdf", "What is the total due?", key, &config).await?;
//!     println!("{}", output.text);
//!     Ok(())
//! }
//! ```
//!
//! ## Keeping a document selected
//!
//! ```rust,no_run
//! use docprompt::{Credential, Pipeline, PipelineConfig, SelectedDocument};
//!
//! # async fn run() -> Result<(), docprompt::DocPromptError> {
//! let mut pipeline = Pipeline::new(&PipelineConfig::default())?;
//! pipeline.select(SelectedDocument::from_path("budget.xlsx"))?;
//! pipeline.invoke(Credential::new("AIza…"), "Which month overspent?").await?;
//! println!("{}", pipeline.result().unwrap_or_default());
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docprompt` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod credential;
pub mod document;
pub mod error;
pub mod notify;
pub mod pipeline;
pub mod process;
pub mod prompts;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{PipelineConfig, PipelineConfigBuilder};
pub use credential::Credential;
pub use document::{DocumentKind, DocumentSource, SelectedDocument};
pub use error::{DocPromptError, GENERIC_FAILURE_NOTICE, UNSUPPORTED_FILE_NOTICE};
pub use notify::{NoopObserver, Notice, NoticeLevel, Observer, PipelineObserver, PipelineState};
pub use pipeline::encode::EncodedPayload;
pub use pipeline::llm::{GeminiBackend, GenerationBackend, GenerationResponse};
pub use pipeline::request::{GenerationRequest, Part};
pub use process::{inspect, process, process_sync, DocumentInfo, GenerationOutput};
pub use session::Pipeline;
