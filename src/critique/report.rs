//! Structured critique returned by the model, and the degraded fallback.

use serde::{Deserialize, Serialize};

use crate::error::{HarmonyError, HarmonyResult};

/// User-facing advisory surfaced when every critique attempt failed.
pub const EXHAUSTED_ADVISORY: &str =
    "Design critique is temporarily unavailable. The harmony score above is still accurate.";

/// Four-field design assessment. Every field is a required string; unknown
/// or missing fields are rejected at the parse boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CritiqueReport {
    pub composition: String,
    pub geometry: String,
    pub styling: String,
    pub verdict: String,
}

impl CritiqueReport {
    /// Names of the required fields, in schema order.
    pub const FIELDS: [&'static str; 4] = ["composition", "geometry", "styling", "verdict"];

    /// Report used when synthesis could not complete.
    pub fn fallback() -> Self {
        Self {
            composition: "Synthesis interrupted: the composition analysis could not be retrieved."
                .to_string(),
            geometry: "Synthesis interrupted: rely on the deterministic ratio and harmony score."
                .to_string(),
            styling: "Synthesis interrupted: styling guidance is unavailable for this scan."
                .to_string(),
            verdict: "Synthesis interrupted. Please rescan later for a full critique.".to_string(),
        }
    }

    /// Parses model output text into a report.
    ///
    /// Text must be a JSON object with exactly the four string fields.
    pub fn parse(text: &str) -> HarmonyResult<Self> {
        serde_json::from_str(text.trim())
            .map_err(|e| HarmonyError::schema_parse(format!("{e}")).with_context("parsing critique text"))
    }
}
