//! The nutrition analysis provider seam.
//!
//! The LLM call itself lives outside this crate; the core consumes it as
//! an opaque function returning a nutrition payload or an error marker.
//! What belongs here is the contract and the response hygiene: a payload
//! carrying an `error` field means "no usable analysis" and must never be
//! persisted as a meal.

use async_trait::async_trait;
use serde_json::Value;

use crate::models::NutritionPayload;

/// Input to an analysis call: a meal photo or a free-text description.
#[derive(Debug, Clone)]
pub enum AnalysisInput {
    ImageBase64(String),
    Text(String),
}

#[derive(Debug, Clone)]
pub enum AnalysisError {
    /// The model declined: no food recognized in the input.
    NotRecognized(String),
    /// The response was not a parseable nutrition payload.
    Malformed(String),
    /// The provider call itself failed (missing key, transport).
    Provider(String),
}

impl std::fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisError::NotRecognized(msg) => write!(f, "Analysis rejected: {}", msg),
            AnalysisError::Malformed(e) => write!(f, "Malformed analysis response: {}", e),
            AnalysisError::Provider(e) => write!(f, "Analysis provider error: {}", e),
        }
    }
}

impl std::error::Error for AnalysisError {}

/// External analysis collaborator. Implementations wrap an LLM or lookup
/// API; the core only sees payload-or-error.
#[async_trait]
pub trait AnalysisProvider: Send + Sync {
    async fn analyze(&self, input: AnalysisInput) -> Result<NutritionPayload, AnalysisError>;
}

/// Parses a raw model response into a nutrition payload.
///
/// Models wrap JSON in markdown fences often enough that stripping them
/// here is cheaper than re-prompting.
pub fn parse_model_response(text: &str) -> Result<NutritionPayload, AnalysisError> {
    let clean = text.replace("```json", "").replace("```", "");
    let clean = clean.trim();

    let value: Value =
        serde_json::from_str(clean).map_err(|e| AnalysisError::Malformed(e.to_string()))?;

    if let Some(error) = value.get("error") {
        let msg = error.as_str().unwrap_or("food not recognized").to_string();
        return Err(AnalysisError::NotRecognized(msg));
    }

    serde_json::from_value(value).map_err(|e| AnalysisError::Malformed(e.to_string()))
}
