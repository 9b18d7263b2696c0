//! Pipeline stages for document prompting.
//!
//! Each submodule implements exactly one transformation step; the stateful
//! driver that sequences them lives in [`crate::session`].
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ validate ──▶ encode ──▶ request ──▶ llm
//! (path/URL) (allow-list) (base64 |   (2 parts)  (Gemini)
//!                          flatten)
//! ```
//!
//! 1. [`input`]    — turn a path or URL into a `SelectedDocument`
//! 2. [`validate`] — accept only images, PDFs and `.xlsx` workbooks
//! 3. [`encode`]   — base64 for binary documents, [`flatten`] for workbooks
//! 4. [`request`]  — payload part followed by the user's instruction
//! 5. [`llm`]      — one generateContent call, no retries

pub mod encode;
pub mod flatten;
pub mod input;
pub mod llm;
pub mod request;
pub mod validate;
