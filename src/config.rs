//! Configuration for the document pipeline.
//!
//! Everything except the credential is controlled through [`PipelineConfig`],
//! built via [`PipelineConfigBuilder`]. The credential is deliberately absent:
//! it is passed to each invocation and dropped when that invocation ends.

use crate::error::DocPromptError;
use crate::notify::{NoopObserver, Observer};
use crate::pipeline::llm::{GenerationBackend, GeminiBackend, DEFAULT_API_BASE_URL, DEFAULT_MODEL};
use std::fmt;
use std::sync::Arc;

/// Gemini's limit on a whole inline request; larger documents cannot be sent.
pub const DEFAULT_MAX_DOCUMENT_BYTES: u64 = 20 * 1024 * 1024;

/// Configuration for a [`crate::Pipeline`].
///
/// # Example
/// ```rust
/// use docprompt::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .model("gemini-1.5-pro")
///     .api_timeout_secs(30)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct PipelineConfig {
    /// Gemini model identifier. Default: `gemini-1.5-flash`.
    pub model: String,

    /// API origin, without a trailing path. Default: the public Gemini endpoint.
    pub api_base_url: String,

    /// HTTP timeout for the generation call in seconds. Default: 120.
    ///
    /// The pipeline itself enforces no timeout; this only bounds the transport.
    pub api_timeout_secs: u64,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Largest document accepted for encoding, in bytes. Default: 20 MiB.
    pub max_document_bytes: u64,

    /// Pre-constructed backend. Takes precedence over `model`/`api_base_url`.
    pub backend: Option<Arc<dyn GenerationBackend>>,

    /// Receives notices and state changes. Default: [`NoopObserver`].
    pub observer: Observer,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_timeout_secs: 120,
            download_timeout_secs: 120,
            max_document_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
            backend: None,
            observer: Arc::new(NoopObserver),
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("model", &self.model)
            .field("api_base_url", &self.api_base_url)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("max_document_bytes", &self.max_document_bytes)
            .field("backend", &self.backend.as_ref().map(|_| "<dyn GenerationBackend>"))
            .field("observer", &"<dyn PipelineObserver>")
            .finish()
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }

    /// The configured backend, or a Gemini backend built from `model` and `api_base_url`.
    pub fn resolve_backend(&self) -> Result<Arc<dyn GenerationBackend>, DocPromptError> {
        if let Some(ref backend) = self.backend {
            return Ok(Arc::clone(backend));
        }
        let gemini = GeminiBackend::new(&self.api_base_url, &self.model, self.api_timeout_secs)?;
        Ok(Arc::new(gemini))
    }
}

/// Builder for [`PipelineConfig`].
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl fmt::Debug for PipelineConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl PipelineConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_base_url = url.into();
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn max_document_bytes(mut self, bytes: u64) -> Self {
        self.config.max_document_bytes = bytes;
        self
    }

    pub fn backend(mut self, backend: Arc<dyn GenerationBackend>) -> Self {
        self.config.backend = Some(backend);
        self
    }

    pub fn observer(mut self, observer: Observer) -> Self {
        self.config.observer = observer;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, DocPromptError> {
        let c = &self.config;
        if c.model.trim().is_empty() {
            return Err(DocPromptError::InvalidConfig("model must not be empty".into()));
        }
        if !(c.api_base_url.starts_with("http://") || c.api_base_url.starts_with("https://")) {
            return Err(DocPromptError::InvalidConfig(format!(
                "api_base_url must be an http(s) URL, got '{}'",
                c.api_base_url
            )));
        }
        if c.api_timeout_secs == 0 || c.download_timeout_secs == 0 {
            return Err(DocPromptError::InvalidConfig(
                "timeouts must be ≥ 1 second".into(),
            ));
        }
        if c.max_document_bytes == 0 {
            return Err(DocPromptError::InvalidConfig(
                "max_document_bytes must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = PipelineConfig::default();
        assert_eq!(c.model, "gemini-1.5-flash");
        assert_eq!(c.api_base_url, "https://generativelanguage.googleapis.com");
        assert_eq!(c.max_document_bytes, 20 * 1024 * 1024);
        assert!(c.backend.is_none());
    }

    #[test]
    fn builder_rejects_empty_model() {
        let err = PipelineConfig::builder().model("  ").build().unwrap_err();
        assert!(matches!(err, DocPromptError::InvalidConfig(_)));
    }

    #[test]
    fn builder_rejects_non_http_base() {
        assert!(PipelineConfig::builder()
            .api_base_url("ftp://nope")
            .build()
            .is_err());
    }

    #[test]
    fn builder_rejects_zero_timeout() {
        assert!(PipelineConfig::builder().api_timeout_secs(0).build().is_err());
    }

    #[test]
    fn debug_hides_trait_objects() {
        let dbg = format!("{:?}", PipelineConfig::default());
        assert!(dbg.contains("gemini-1.5-flash"));
        assert!(dbg.contains("<dyn PipelineObserver>"));
    }

    #[test]
    fn resolves_gemini_backend_by_default() {
        let backend = PipelineConfig::default().resolve_backend().unwrap();
        assert_eq!(backend.model_id(), "gemini-1.5-flash");
    }
}
