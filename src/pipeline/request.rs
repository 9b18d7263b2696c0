//! Request assembly: payload + instruction → two-part [`GenerationRequest`].

use crate::pipeline::encode::EncodedPayload;
use crate::prompts::spreadsheet_part;
use serde::{Deserialize, Serialize};

/// One element of a generation request.
///
/// Serialises to the generateContent part shapes: `{"text": …}` or
/// `{"inline_data": {"mime_type": …, "data": …}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }

    pub fn inline(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Part::InlineData {
            inline_data: InlineData {
                mime_type: mime_type.into(),
                data: data.into(),
            },
        }
    }
}

/// Ordered parts sent to the model: document payload first, instruction last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    parts: Vec<Part>,
}

impl GenerationRequest {
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// The user's instruction, as sent.
    pub fn instruction(&self) -> &str {
        match self.parts.last() {
            Some(Part::Text { text }) => text,
            _ => "",
        }
    }
}

/// Build the request for an encoded document and a user instruction.
pub fn assemble(payload: EncodedPayload, instruction: &str) -> GenerationRequest {
    let payload_part = match payload {
        EncodedPayload::Inline { data, mime_type } => Part::inline(mime_type, data),
        EncodedPayload::Transcript(transcript) => Part::text(spreadsheet_part(&transcript)),
    };

    GenerationRequest {
        parts: vec![payload_part, Part::text(instruction)],
    }
}
