//! The stateful document pipeline: select a document, then invoke.
//!
//! A [`Pipeline`] owns exactly one selected document and one result slot.
//! [`Pipeline::invoke`] takes `&mut self`, so a single instance can never
//! have two requests in flight; callers that want a fresh attempt simply
//! invoke again once the previous one has settled.
//!
//! ```text
//!            invoke                 success
//!   Idle ───────────▶ InFlight ─────────────▶ Completed ─┐
//!     ▲                  │ any failure                   │ invoke
//!     │                  ▼                               │
//!     │               Errored ◀──────────────────────────┘
//!     └─ (new Pipeline)     └──── invoke ──▶ InFlight
//! ```

use crate::config::PipelineConfig;
use crate::credential::Credential;
use crate::document::{DocumentKind, SelectedDocument};
use crate::error::DocPromptError;
use crate::notify::{Notice, Observer, PipelineState};
use crate::pipeline::encode::encode;
use crate::pipeline::llm::{GenerationBackend, GenerationResponse};
use crate::pipeline::request::assemble;
use crate::pipeline::validate::validate;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Success notice shown when a generation call completes.
pub const COMPLETED_NOTICE: &str = "Document processed successfully.";

/// Drives validate → encode → request → generate for one selected document.
pub struct Pipeline {
    backend: Arc<dyn GenerationBackend>,
    observer: Observer,
    max_document_bytes: u64,
    selected: Option<(SelectedDocument, DocumentKind)>,
    state: PipelineState,
    result: Option<String>,
}

impl Pipeline {
    /// Create an idle pipeline with no document selected.
    pub fn new(config: &PipelineConfig) -> Result<Self, DocPromptError> {
        Ok(Self {
            backend: config.resolve_backend()?,
            observer: Arc::clone(&config.observer),
            max_document_bytes: config.max_document_bytes,
            selected: None,
            state: PipelineState::Idle,
            result: None,
        })
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Text of the last successful invocation; `None` while idle, in flight or errored.
    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    pub fn document(&self) -> Option<&SelectedDocument> {
        self.selected.as_ref().map(|(doc, _)| doc)
    }

    /// Select a document, replacing any previous selection.
    ///
    /// An unsupported file type is reported to the observer and returned as
    /// an error; the previous selection and the pipeline state are kept.
    pub fn select(&mut self, doc: SelectedDocument) -> Result<DocumentKind, DocPromptError> {
        match validate(&doc) {
            Ok(kind) => {
                debug!("Selected {} as {:?}", doc.name(), kind);
                self.observer
                    .on_notice(&Notice::success(format!("Document selected: {}", doc.name())));
                self.selected = Some((doc, kind));
                Ok(kind)
            }
            Err(e) => {
                warn!("{}", e);
                self.observer.on_notice(&Notice::error(e.user_notice()));
                Err(e)
            }
        }
    }

    /// Process the selected document with `instruction`.
    ///
    /// Returns [`DocPromptError::MissingInput`] without touching any state
    /// when the credential, the instruction or the document is missing.
    /// Otherwise the pipeline moves to `InFlight` and settles in `Completed`
    /// (result set to the response text, unaltered) or `Errored` (result
    /// cleared, one generic failure notice emitted).
    ///
    /// The credential is consumed and wiped when this call returns.
    pub async fn invoke(
        &mut self,
        credential: Credential,
        instruction: &str,
    ) -> Result<GenerationResponse, DocPromptError> {
        if credential.is_empty() {
            return Err(DocPromptError::MissingInput { field: "an API key" });
        }
        if instruction.is_empty() {
            return Err(DocPromptError::MissingInput {
                field: "an instruction",
            });
        }
        let Some((doc, kind)) = self.selected.clone() else {
            return Err(DocPromptError::MissingInput { field: "a document" });
        };

        self.result = None;
        self.transition(PipelineState::InFlight);
        info!("Processing {} with {}", doc.name(), self.backend.model_id());

        match self.run(&credential, &doc, kind, instruction).await {
            Ok(response) => {
                info!(
                    "Completed {}: {} input tokens, {} output tokens",
                    doc.name(),
                    response.input_tokens,
                    response.output_tokens
                );
                self.result = Some(response.text.clone());
                self.transition(PipelineState::Completed);
                self.observer.on_notice(&Notice::success(COMPLETED_NOTICE));
                Ok(response)
            }
            Err(e) => {
                warn!("Error processing document {}: {}", doc.name(), e);
                self.transition(PipelineState::Errored);
                self.observer.on_notice(&Notice::error(e.user_notice()));
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        credential: &Credential,
        doc: &SelectedDocument,
        kind: DocumentKind,
        instruction: &str,
    ) -> Result<GenerationResponse, DocPromptError> {
        let payload = encode(doc, kind, self.max_document_bytes).await?;
        let request = assemble(payload, instruction);
        self.backend.generate(credential, &request).await
    }

    fn transition(&mut self, next: PipelineState) {
        debug!("Pipeline {} → {}", self.state, next);
        self.state = next;
        self.observer.on_state_change(next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UNSUPPORTED_FILE_NOTICE;
    use crate::notify::{NoticeLevel, PipelineObserver};
    use crate::pipeline::request::GenerationRequest;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct Echo {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl GenerationBackend for Echo {
        async fn generate(
            &self,
            _credential: &Credential,
            request: &GenerationRequest,
        ) -> Result<GenerationResponse, DocPromptError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(GenerationResponse {
                text: format!("echo: {}", request.instruction()),
                ..Default::default()
            })
        }

        fn model_id(&self) -> &str {
            "echo"
        }
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<Notice>>);

    impl PipelineObserver for Recorder {
        fn on_notice(&self, notice: &Notice) {
            self.0.lock().unwrap().push(notice.clone());
        }
    }

    fn pipeline(echo: Arc<Echo>, recorder: Arc<Recorder>) -> Pipeline {
        let config = PipelineConfig::builder()
            .backend(echo)
            .observer(recorder)
            .build()
            .unwrap();
        Pipeline::new(&config).unwrap()
    }

    fn pdf() -> SelectedDocument {
        SelectedDocument::from_bytes("a.pdf", "application/pdf", b"%PDF-1.7".to_vec())
    }

    #[tokio::test]
    async fn rejected_selection_keeps_previous_document() {
        let recorder = Arc::new(Recorder::default());
        let echo = Arc::new(Echo {
            calls: AtomicUsize::new(0),
        });
        let mut p = pipeline(echo, Arc::clone(&recorder));

        p.select(pdf()).unwrap();
        let err = p
            .select(SelectedDocument::from_bytes("x.txt", "text/plain", Vec::new()))
            .unwrap_err();

        assert!(err.is_validation());
        assert_eq!(p.document().unwrap().name(), "a.pdf");
        assert_eq!(p.state(), PipelineState::Idle);

        let notices = recorder.0.lock().unwrap();
        let last = notices.last().unwrap();
        assert_eq!(last.level, NoticeLevel::Error);
        assert_eq!(last.message, UNSUPPORTED_FILE_NOTICE);
    }

    #[tokio::test]
    async fn successful_invoke_completes() {
        let echo = Arc::new(Echo {
            calls: AtomicUsize::new(0),
        });
        let mut p = pipeline(Arc::clone(&echo), Arc::new(Recorder::default()));
        p.select(pdf()).unwrap();

        let resp = p.invoke(Credential::new("k"), "hi").await.unwrap();
        assert_eq!(resp.text, "echo: hi");
        assert_eq!(p.state(), PipelineState::Completed);
        assert_eq!(p.result(), Some("echo: hi"));
        assert_eq!(echo.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_document_is_gated() {
        let echo = Arc::new(Echo {
            calls: AtomicUsize::new(0),
        });
        let mut p = pipeline(Arc::clone(&echo), Arc::new(Recorder::default()));

        let err = p.invoke(Credential::new("k"), "hi").await.unwrap_err();
        assert!(matches!(err, DocPromptError::MissingInput { field: "a document" }));
        assert_eq!(p.state(), PipelineState::Idle);
        assert_eq!(echo.calls.load(Ordering::SeqCst), 0);
    }
}
