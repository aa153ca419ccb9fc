//! Disease-scan orchestrator
//!
//! Three sequential stages turn an uploaded plant image into a fully
//! populated [`DiagnosisResult`]:
//!
//! 1. **Primary backend attempt** — when a primary ML backend is
//!    configured, ask it first. Any failure here is swallowed and logged;
//!    the caller never sees it.
//! 2. **Generative-AI classification fallback** — vision completion with a
//!    fixed instruction prompt, answer recovered from the completion text
//!    via balanced-brace JSON extraction. An HTTP failure at this stage is
//!    fatal: there is nothing left to fall back to.
//! 3. **Recovery-plan backfill** — when the working result names a disease
//!    but carries no recovery plan, one text completion fills the gap.
//!    This stage never aborts the scan.
//!
//! Normalization then substitutes fixed defaults for anything still
//! missing, so every returned diagnosis has all four fields set.

use crate::services::gemini_client::{CompletionApi, GeminiError};
use crate::services::ml_backend_client::PredictBackend;
use crate::services::response_parser::{extract_structured, Extraction};
use crate::types::{DiagnosisResult, RawClassifierOutput, Severity};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

const SCAN_PROMPT: &str = "Analyze this plant image for diseases or health issues. \
    Identify any disease, assess severity (mild/moderate/severe), and provide a detailed \
    recovery plan. Format your response as JSON with fields: disease, confidence (0-1), \
    severity, recoveryPlan. If the plant appears healthy, set disease to \"Healthy\" and \
    provide care tips.";

// Placeholder sets for the two classification-fallback failure cases:
// "no JSON found" and "JSON found but invalid" carry different labels and
// confidences. Callers may rely on the exact values, so both tiers stay
// distinct.
const NO_JSON_DISEASE: &str = "Analysis Complete";
const NO_JSON_CONFIDENCE: f64 = 0.7;
const INVALID_JSON_DISEASE: &str = "Health Check";
const INVALID_JSON_CONFIDENCE: f64 = 0.6;

// Normalization defaults for fields still missing after all stages.
const DEFAULT_DISEASE: &str = "Unknown Disease";
const DEFAULT_CONFIDENCE: f64 = 0.75;
const DEFAULT_SEVERITY: Severity = Severity::Moderate;
const DEFAULT_RECOVERY_PLAN: &str =
    "Please consult with a plant expert for specific treatment.";

/// Disease-scan errors
///
/// Only total unavailability of the classification fallback is fatal;
/// every other upstream problem is recovered through defaulting.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Classification service unavailable: {0}")]
    ClassifierUnavailable(#[from] GeminiError),
}

/// Disease-scan orchestrator
pub struct DiseaseScanner {
    primary: Option<Arc<dyn PredictBackend>>,
    completions: Arc<dyn CompletionApi>,
}

impl DiseaseScanner {
    pub fn new(
        primary: Option<Arc<dyn PredictBackend>>,
        completions: Arc<dyn CompletionApi>,
    ) -> Self {
        Self {
            primary,
            completions,
        }
    }

    /// Run the full scan pipeline over one uploaded image.
    pub async fn scan(
        &self,
        mime_type: &str,
        image: &[u8],
    ) -> Result<DiagnosisResult, ScanError> {
        let scan_id = Uuid::new_v4();
        let image_base64 = BASE64.encode(image);

        info!(
            scan_id = %scan_id,
            mime_type = %mime_type,
            image_bytes = image.len(),
            "Starting disease scan"
        );

        // Stage 1: primary backend, silent fallback on any failure
        let mut working = match self.try_primary(scan_id, &image_base64).await {
            Some(result) => result,
            // Stage 2: generative-AI classification, fatal on HTTP failure
            None => self.classify_with_vision(scan_id, mime_type, &image_base64).await?,
        };

        // Stage 3: recovery-plan backfill, never fatal
        if working.has_disease() && !working.has_recovery_plan() {
            self.backfill_recovery_plan(scan_id, &mut working).await;
        }

        let result = normalize(working);

        info!(
            scan_id = %scan_id,
            disease = %result.disease,
            confidence = result.confidence,
            severity = %result.severity,
            "Disease scan complete"
        );

        Ok(result)
    }

    /// Stage 1: ask the primary backend when one is configured.
    ///
    /// `None` means "fall through to classification": backend absent,
    /// unreachable, non-success, or undecodable body.
    async fn try_primary(
        &self,
        scan_id: Uuid,
        image_base64: &str,
    ) -> Option<RawClassifierOutput> {
        let backend = self.primary.as_ref()?;

        match backend.predict(image_base64).await {
            Ok(result) => {
                info!(
                    scan_id = %scan_id,
                    disease = result.disease.as_deref().unwrap_or("<none>"),
                    "Primary backend produced a classification"
                );
                Some(result)
            }
            Err(e) => {
                warn!(
                    scan_id = %scan_id,
                    error = %e,
                    "Primary backend failed, falling back to generative classification"
                );
                None
            }
        }
    }

    /// Stage 2: classify via vision completion.
    async fn classify_with_vision(
        &self,
        scan_id: Uuid,
        mime_type: &str,
        image_base64: &str,
    ) -> Result<RawClassifierOutput, ScanError> {
        let text = self
            .completions
            .vision_completion(SCAN_PROMPT, mime_type, image_base64)
            .await?;

        Ok(match extract_structured::<RawClassifierOutput>(&text) {
            Extraction::Structured(raw) => {
                debug!(scan_id = %scan_id, "Classification answer parsed from completion");
                raw
            }
            Extraction::NoJson => {
                debug!(scan_id = %scan_id, "Completion had no structured answer, using prose");
                RawClassifierOutput {
                    disease: Some(NO_JSON_DISEASE.to_string()),
                    confidence: Some(NO_JSON_CONFIDENCE),
                    severity: Some(Severity::Moderate.as_str().to_string()),
                    recovery_plan: Some(text),
                }
            }
            Extraction::InvalidJson => {
                debug!(scan_id = %scan_id, "Completion answer was invalid JSON, using prose");
                RawClassifierOutput {
                    disease: Some(INVALID_JSON_DISEASE.to_string()),
                    confidence: Some(INVALID_JSON_CONFIDENCE),
                    severity: Some(Severity::Moderate.as_str().to_string()),
                    recovery_plan: Some(text),
                }
            }
        })
    }

    /// Stage 3: fetch a dedicated recovery plan for the detected disease.
    async fn backfill_recovery_plan(&self, scan_id: Uuid, working: &mut RawClassifierOutput) {
        let disease = working.disease.as_deref().unwrap_or_default();
        let severity = working.severity.as_deref().unwrap_or("unknown");

        let prompt = format!(
            "Create a detailed recovery plan for a plant with {} (severity: {}). \
             Include immediate actions, treatment steps, prevention tips, and timeline \
             for recovery.",
            disease, severity
        );

        match self.completions.text_completion(&prompt).await {
            Ok(plan) if !plan.trim().is_empty() => {
                debug!(scan_id = %scan_id, "Recovery plan backfilled");
                working.recovery_plan = Some(plan);
            }
            Ok(_) => {
                warn!(scan_id = %scan_id, "Recovery-plan completion was empty, using fallback");
            }
            Err(e) => {
                warn!(
                    scan_id = %scan_id,
                    error = %e,
                    "Recovery-plan completion failed, using fallback"
                );
            }
        }
    }
}

/// Substitute defaults for every still-missing field.
fn normalize(raw: RawClassifierOutput) -> DiagnosisResult {
    DiagnosisResult {
        disease: raw
            .disease
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DISEASE.to_string()),
        confidence: raw.confidence.unwrap_or(DEFAULT_CONFIDENCE),
        severity: raw
            .severity
            .as_deref()
            .and_then(Severity::parse_loose)
            .unwrap_or(DEFAULT_SEVERITY),
        recovery_plan: raw
            .recovery_plan
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_RECOVERY_PLAN.to_string()),
    }
}
