//! Plant identification
//!
//! Single-stage sibling of the disease scan: one vision completion, the
//! shared balanced-brace extraction, and two-tier defaults when the
//! completion is prose-only or carries invalid JSON. There is no fallback
//! chain here; an HTTP failure of the completion call fails the operation.

use crate::services::gemini_client::{CompletionApi, GeminiError};
use crate::services::response_parser::{extract_structured, Extraction};
use crate::types::IdentificationResult;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

const IDENTIFY_PROMPT: &str = "Identify this plant. Provide the common name, scientific \
    name, and detailed care instructions including light, water, temperature, and soil \
    requirements. Format your response as JSON with fields: commonName, scientificName, \
    careInstructions, confidence (0-1).";

const DEFAULT_CONFIDENCE: f64 = 0.75;

/// Plant-identification errors
#[derive(Debug, Error)]
pub enum IdentifyError {
    #[error("Identification service unavailable: {0}")]
    ServiceUnavailable(#[from] GeminiError),
}

/// Structured identification answer embedded in the completion text.
#[derive(Debug, Clone, Default, Deserialize)]
struct RawIdentification {
    #[serde(rename = "commonName", alias = "common_name")]
    common_name: Option<String>,
    #[serde(rename = "scientificName", alias = "scientific_name")]
    scientific_name: Option<String>,
    #[serde(rename = "careInstructions", alias = "care_instructions")]
    care_instructions: Option<String>,
    confidence: Option<f64>,
}

/// Plant identifier
pub struct PlantIdentifier {
    completions: Arc<dyn CompletionApi>,
}

impl PlantIdentifier {
    pub fn new(completions: Arc<dyn CompletionApi>) -> Self {
        Self { completions }
    }

    /// Identify the plant in one uploaded image.
    pub async fn identify(
        &self,
        mime_type: &str,
        image: &[u8],
    ) -> Result<IdentificationResult, IdentifyError> {
        let request_id = Uuid::new_v4();
        let image_base64 = BASE64.encode(image);

        info!(
            request_id = %request_id,
            mime_type = %mime_type,
            image_bytes = image.len(),
            "Starting plant identification"
        );

        let text = self
            .completions
            .vision_completion(IDENTIFY_PROMPT, mime_type, &image_base64)
            .await?;

        let raw = match extract_structured::<RawIdentification>(&text) {
            Extraction::Structured(raw) => {
                debug!(request_id = %request_id, "Identification answer parsed from completion");
                raw
            }
            Extraction::NoJson => RawIdentification {
                common_name: Some("Unknown Plant".to_string()),
                scientific_name: Some("Species identification needed".to_string()),
                care_instructions: Some(text.clone()),
                confidence: Some(0.7),
            },
            Extraction::InvalidJson => RawIdentification {
                common_name: Some("Plant".to_string()),
                scientific_name: Some("See care instructions".to_string()),
                care_instructions: Some(text.clone()),
                confidence: Some(0.6),
            },
        };

        let result = IdentificationResult {
            species: format!(
                "{} ({})",
                raw.common_name.as_deref().unwrap_or("Unknown Plant"),
                raw.scientific_name
                    .as_deref()
                    .unwrap_or("Species identification needed"),
            ),
            confidence: raw.confidence.unwrap_or(DEFAULT_CONFIDENCE),
            care_instructions: raw
                .care_instructions
                .filter(|c| !c.trim().is_empty())
                .unwrap_or(text),
        };

        info!(
            request_id = %request_id,
            species = %result.species,
            confidence = result.confidence,
            "Plant identification complete"
        );

        Ok(result)
    }
}
