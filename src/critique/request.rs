//! Wire format of the `generateContent` call.
//!
//! Request and response bodies mirror the generative-language REST API in
//! camelCase. Only the fields this crate reads are modelled on the response.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::analysis::ProportionResult;
use crate::critique::report::CritiqueReport;
use crate::error::{HarmonyError, HarmonyResult};
use crate::imaging::EncodedPayload;

pub const SYSTEM_INSTRUCTION: &str = "You are a senior visual design critic specialising in classical \
proportion, sacred geometry and the golden ratio. You review a single image together with a measured \
proportion and respond only with the requested JSON object: concise, concrete, and free of markdown.";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub system_instruction: SystemInstruction,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SystemInstruction {
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineDataPayload,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineDataPayload {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_mime_type: String,
    pub max_output_tokens: u32,
    pub response_schema: ResponseSchema,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResponseSchema {
    #[serde(rename = "type")]
    pub kind: String,
    pub properties: BTreeMap<String, SchemaProperty>,
    pub required: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SchemaProperty {
    #[serde(rename = "type")]
    pub kind: String,
}

impl ResponseSchema {
    /// Object schema requiring every [`CritiqueReport::FIELDS`] entry as a string.
    pub fn critique_report() -> Self {
        let properties = CritiqueReport::FIELDS
            .iter()
            .map(|name| {
                (
                    name.to_string(),
                    SchemaProperty {
                        kind: "STRING".to_string(),
                    },
                )
            })
            .collect();
        Self {
            kind: "OBJECT".to_string(),
            properties,
            required: CritiqueReport::FIELDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// User instruction embedding the measured proportion.
pub fn user_instruction(stats: &ProportionResult) -> String {
    format!(
        "Critique this design's proportions. Observed ratio: {:.3}. Target golden ratio: {:.3}. \
Deviation from target: {:+.2}%. Harmony score: {}/100. \
Return composition, geometry, styling and verdict.",
        stats.ratio, stats.target, stats.variance, stats.score
    )
}

/// Builds the complete request body for one critique.
pub fn build_request(
    payload: &EncodedPayload,
    stats: &ProportionResult,
    max_output_tokens: u32,
) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content {
            role: "user".to_string(),
            parts: vec![
                Part::Text {
                    text: user_instruction(stats),
                },
                Part::InlineData {
                    inline_data: InlineDataPayload {
                        mime_type: payload.mime_type().to_string(),
                        data: payload.to_base64(),
                    },
                },
            ],
        }],
        system_instruction: SystemInstruction {
            parts: vec![Part::Text {
                text: SYSTEM_INSTRUCTION.to_string(),
            }],
        },
        generation_config: GenerationConfig {
            response_mime_type: "application/json".to_string(),
            max_output_tokens,
            response_schema: ResponseSchema::critique_report(),
        },
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateContentResponse {
    pub candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub content: Option<ContentResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentResponse {
    pub parts: Option<Vec<PartResponse>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartResponse {
    pub text: Option<String>,
}

impl GenerateContentResponse {
    /// Response whose first candidate carries `text` as its only part.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            candidates: Some(vec![Candidate {
                content: Some(ContentResponse {
                    parts: Some(vec![PartResponse {
                        text: Some(text.into()),
                    }]),
                }),
            }]),
        }
    }

    /// `candidates[0].content.parts[0].text`, if present and non-blank.
    pub fn first_text(&self) -> HarmonyResult<&str> {
        self.candidates
            .as_deref()
            .and_then(|candidates| candidates.first())
            .and_then(|candidate| candidate.content.as_ref())
            .and_then(|content| content.parts.as_deref())
            .and_then(|parts| parts.first())
            .and_then(|part| part.text.as_deref())
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| {
                HarmonyError::empty_response("no text in candidates[0].content.parts[0]")
            })
    }
}
