//! Core types for the plant analysis pipelines
//!
//! Shared between the disease-scan orchestrator, the plant identifier,
//! and the API layer. All caller-facing shapes live here so handlers
//! serialize exactly what the pipelines produce.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Disease severity as reported to the caller.
///
/// Upstream services report severity as free text; anything that does not
/// map to a known level is treated as missing and defaulted during
/// normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Mild,
    Moderate,
    Severe,
    Unknown,
}

impl Severity {
    /// Parse a free-text severity label (case-insensitive, whitespace-tolerant).
    pub fn parse_loose(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mild" => Some(Self::Mild),
            "moderate" => Some(Self::Moderate),
            "severe" => Some(Self::Severe),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mild => "mild",
            Self::Moderate => "moderate",
            Self::Severe => "severe",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Untyped classifier output from either the primary ML backend or the
/// generative-AI fallback.
///
/// Every field is optional; the orchestrator resolves missing fields
/// through explicit defaulting rather than probing ad hoc.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawClassifierOutput {
    pub disease: Option<String>,
    pub confidence: Option<f64>,
    pub severity: Option<String>,
    #[serde(rename = "recoveryPlan", alias = "recovery_plan")]
    pub recovery_plan: Option<String>,
}

impl RawClassifierOutput {
    /// True when a non-blank disease name is present.
    pub fn has_disease(&self) -> bool {
        self.disease
            .as_deref()
            .map(|d| !d.trim().is_empty())
            .unwrap_or(false)
    }

    /// True when a non-blank recovery plan is present.
    pub fn has_recovery_plan(&self) -> bool {
        self.recovery_plan
            .as_deref()
            .map(|p| !p.trim().is_empty())
            .unwrap_or(false)
    }
}

/// Normalized diagnosis returned to the caller.
///
/// Always fully populated: the orchestrator substitutes defaults for any
/// field the upstream services omitted or returned in unparseable form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisResult {
    pub disease: String,
    pub confidence: f64,
    pub severity: Severity,
    #[serde(rename = "recoveryPlan")]
    pub recovery_plan: String,
}

/// Plant identification returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentificationResult {
    /// "Common Name (Scientific name)"
    pub species: String,
    pub confidence: f64,
    #[serde(rename = "careInstructions")]
    pub care_instructions: String,
}
