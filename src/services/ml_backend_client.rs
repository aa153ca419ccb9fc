//! Primary ML backend client
//!
//! Optional operator-configured inference service queried before the
//! generative-AI fallback. The wire contract is `POST {base}/predict` with
//! `{"image": "<base64>"}`; a success body carries at least `disease` and
//! may add `confidence`, `severity`, `recoveryPlan`, and an
//! `all_predictions` score map.

use crate::types::RawClassifierOutput;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Primary backend client errors
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// `POST /predict` response body
#[derive(Debug, Clone, Deserialize)]
pub struct PredictResponse {
    pub disease: Option<String>,
    pub confidence: Option<f64>,
    pub severity: Option<String>,
    #[serde(rename = "recoveryPlan", alias = "recovery_plan")]
    pub recovery_plan: Option<String>,
    /// Per-class scores, present when the backend exposes its full softmax.
    #[serde(default)]
    pub all_predictions: Option<HashMap<String, f64>>,
}

impl From<PredictResponse> for RawClassifierOutput {
    fn from(response: PredictResponse) -> Self {
        Self {
            disease: response.disease,
            confidence: response.confidence,
            severity: response.severity,
            recovery_plan: response.recovery_plan,
        }
    }
}

/// Prediction seam for the orchestrator's first stage.
#[async_trait]
pub trait PredictBackend: Send + Sync {
    async fn predict(&self, image_base64: &str) -> Result<RawClassifierOutput, BackendError>;
}

#[async_trait]
impl PredictBackend for PrimaryBackendClient {
    async fn predict(&self, image_base64: &str) -> Result<RawClassifierOutput, BackendError> {
        PrimaryBackendClient::predict(self, image_base64)
            .await
            .map(RawClassifierOutput::from)
    }
}

/// Primary ML backend client
pub struct PrimaryBackendClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl PrimaryBackendClient {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, BackendError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Classify a base64-encoded image.
    pub async fn predict(&self, image_base64: &str) -> Result<PredictResponse, BackendError> {
        let url = format!("{}/predict", self.base_url);

        debug!(url = %url, "Querying primary ML backend");

        let response = self
            .http_client
            .post(&url)
            .json(&serde_json::json!({ "image": image_base64 }))
            .send()
            .await
            .map_err(|e| BackendError::NetworkError(e.to_string()))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(BackendError::ApiError(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| BackendError::ParseError(e.to_string()))
    }

    /// Probe the backend's `/health` endpoint.
    ///
    /// Used once at startup to log availability; scan requests never call
    /// this, they just fall back when `predict` fails.
    pub async fn check_health(&self) -> Result<(), BackendError> {
        let url = format!("{}/health", self.base_url);

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| BackendError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(BackendError::ApiError(status.as_u16(), error_text));
        }

        Ok(())
    }
}
