//! Remote generation: send a [`GenerationRequest`] and get text back.
//!
//! [`GenerationBackend`] is the seam between the pipeline and the network.
//! The production implementation is [`GeminiBackend`], which talks to the
//! Gemini `generateContent` REST endpoint; tests plug in scripted backends.
//!
//! One call, one response. There is deliberately no retry loop here: a
//! failed call surfaces immediately and the user decides whether to try
//! again.

use crate::credential::Credential;
use crate::error::DocPromptError;
use crate::pipeline::request::{GenerationRequest, Part};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Default Gemini API origin.
pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default model for document questions.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Header carrying the API key, so the key never appears in a URL or log line.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Finish reasons for which the candidate text must not be used.
const BLOCKED_FINISH_REASONS: &[&str] = &["SAFETY", "RECITATION", "LANGUAGE"];

/// Text produced by one successful generation call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationResponse {
    /// Extracted text, exactly as returned.
    pub text: String,
    pub input_tokens: usize,
    pub output_tokens: usize,
}

/// A remote text-generation service.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Send `request` authenticated with `credential` and await the full response.
    async fn generate(
        &self,
        credential: &Credential,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, DocPromptError>;

    /// Model identifier, for diagnostics.
    fn model_id(&self) -> &str;
}

/// Gemini `generateContent` over HTTPS.
#[derive(Debug, Clone)]
pub struct GeminiBackend {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl GeminiBackend {
    /// Build a backend; `timeout_secs` bounds each HTTP call.
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, DocPromptError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| DocPromptError::Internal(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

#[async_trait]
impl GenerationBackend for GeminiBackend {
    async fn generate(
        &self,
        credential: &Credential,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, DocPromptError> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: request.parts(),
            }],
        };

        debug!("POST {} ({} parts)", self.endpoint(), request.parts().len());

        let response = self
            .client
            .post(self.endpoint())
            .header(API_KEY_HEADER, credential.expose())
            .json(&body)
            .send()
            .await
            .map_err(|e| DocPromptError::Remote {
                status: None,
                detail: if e.is_timeout() {
                    "request timed out".to_string()
                } else {
                    e.to_string()
                },
            })?;

        let status = response.status();
        let raw = response.text().await.map_err(|e| DocPromptError::Remote {
            status: Some(status.as_u16()),
            detail: format!("failed to read response body: {e}"),
        })?;

        if !status.is_success() {
            return Err(DocPromptError::Remote {
                status: Some(status.as_u16()),
                detail: error_detail(&raw),
            });
        }

        parse_response(&raw)
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

/// Extract the generated text from a successful response body.
///
/// The text is the concatenation of every text part of the first candidate.
pub fn parse_response(raw: &str) -> Result<GenerationResponse, DocPromptError> {
    let parsed: GenerateContentResponse =
        serde_json::from_str(raw).map_err(|e| DocPromptError::Remote {
            status: None,
            detail: format!("malformed response: {e}"),
        })?;

    let Some(candidate) = parsed.candidates.into_iter().next() else {
        let detail = match parsed.prompt_feedback.and_then(|f| f.block_reason) {
            Some(reason) => format!("prompt blocked: {reason}"),
            None => "response contained no candidates".to_string(),
        };
        return Err(DocPromptError::Remote {
            status: None,
            detail,
        });
    };

    if let Some(reason) = candidate.finish_reason.as_deref() {
        if BLOCKED_FINISH_REASONS.contains(&reason) {
            return Err(DocPromptError::Remote {
                status: None,
                detail: format!("candidate blocked: {reason}"),
            });
        }
    }

    let text: String = candidate
        .content
        .map(|c| c.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|p| p.text)
        .collect();

    let usage = parsed.usage_metadata.unwrap_or_default();
    Ok(GenerationResponse {
        text,
        input_tokens: usage.prompt_token_count,
        output_tokens: usage.candidates_token_count,
    })
}

fn error_detail(raw: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(raw) {
        Ok(env) => env.error.message,
        Err(_) if raw.chars().count() > 200 => {
            format!("{}…", raw.chars().take(200).collect::<String>())
        }
        Err(_) => raw.to_string(),
    }
}

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: &'a [Part],
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: usize,
    #[serde(default)]
    candidates_token_count: usize,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::encode::EncodedPayload;
    use crate::pipeline::request::assemble;

    #[test]
    fn request_body_shape() {
        let req = assemble(
            EncodedPayload::Inline {
                data: "QUJD".into(),
                mime_type: "application/pdf".into(),
            },
            "What is this?",
        );
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: req.parts(),
            }],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "contents": [{
                    "role": "user",
                    "parts": [
                        {"inline_data": {"mime_type": "application/pdf", "data": "QUJD"}},
                        {"text": "What is this?"}
                    ]
                }]
            })
        );
    }

    #[test]
    fn text_parts_are_concatenated_verbatim() {
        let raw = r#"{
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "  Hello"}, {"text": ", world \n"}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 3, "totalTokenCount": 15}
        }"#;
        let resp = parse_response(raw).unwrap();
        assert_eq!(resp.text, "  Hello, world \n");
        assert_eq!(resp.input_tokens, 12);
        assert_eq!(resp.output_tokens, 3);
    }

    #[test]
    fn blocked_prompt_is_remote_error() {
        let raw = r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#;
        let err = parse_response(raw).unwrap_err();
        assert!(err.to_string().contains("prompt blocked: SAFETY"), "got: {err}");
    }

    #[test]
    fn blocked_candidate_is_remote_error() {
        let raw = r#"{"candidates": [{"finishReason": "RECITATION"}]}"#;
        assert!(matches!(
            parse_response(raw),
            Err(DocPromptError::Remote { .. })
        ));
    }

    #[test]
    fn candidate_without_text_yields_empty_string() {
        let raw = r#"{"candidates": [{"content": {"parts": []}, "finishReason": "MAX_TOKENS"}]}"#;
        assert_eq!(parse_response(raw).unwrap().text, "");
    }

    #[test]
    fn malformed_json_is_remote_error() {
        assert!(matches!(
            parse_response("<html>bad gateway</html>"),
            Err(DocPromptError::Remote { status: None, .. })
        ));
    }

    #[test]
    fn error_envelope_message_is_extracted() {
        let raw = r#"{"error": {"code": 400, "message": "API key not valid.", "status": "INVALID_ARGUMENT"}}"#;
        assert_eq!(error_detail(raw), "API key not valid.");
        assert_eq!(error_detail("plain"), "plain");
    }

    #[test]
    fn endpoint_includes_model_not_key() {
        let backend = GeminiBackend::new("https://example.test/", "gemini-1.5-flash", 5).unwrap();
        assert_eq!(
            backend.endpoint(),
            "https://example.test/v1beta/models/gemini-1.5-flash:generateContent"
        );
        assert_eq!(backend.model_id(), "gemini-1.5-flash");
    }
}
