//! Google Generative Language API client
//!
//! Wraps the two completion shapes the pipelines need: a vision completion
//! (prompt + inline base64 image) and a plain text completion. Vision
//! classification uses `gemini-2.5-flash`; recovery-plan text generation
//! uses `gemini-1.5-flash`.
//!
//! Error policy: network failures and non-success HTTP statuses are
//! reported as errors (callers decide whether that is fatal). A success
//! response whose body cannot be decoded, or that carries no candidate
//! text, degrades to an empty completion string with a warning; malformed
//! payloads are recovered downstream through defaulting, never surfaced.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const VISION_MODEL: &str = "gemini-2.5-flash";
const TEXT_MODEL: &str = "gemini-1.5-flash";

/// Generative-AI client errors
#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(rename = "inline_data", skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<TextPart>,
}

#[derive(Debug, Deserialize)]
struct TextPart {
    #[serde(default)]
    text: String,
}

impl GenerateResponse {
    /// Text of the first candidate's first part, empty when absent.
    fn completion_text(self) -> String {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .map(|p| p.text)
            .unwrap_or_default()
    }
}

/// Completion seam used by the pipelines.
///
/// The orchestrator and the identifier depend on this trait rather than on
/// `GeminiClient` directly so their fallback logic is testable with
/// in-memory fakes.
#[async_trait]
pub trait CompletionApi: Send + Sync {
    /// Prompt plus inline base64 image; returns the completion text.
    async fn vision_completion(
        &self,
        prompt: &str,
        mime_type: &str,
        image_base64: &str,
    ) -> Result<String, GeminiError>;

    /// Text-only prompt; returns the completion text.
    async fn text_completion(&self, prompt: &str) -> Result<String, GeminiError>;
}

#[async_trait]
impl CompletionApi for GeminiClient {
    async fn vision_completion(
        &self,
        prompt: &str,
        mime_type: &str,
        image_base64: &str,
    ) -> Result<String, GeminiError> {
        GeminiClient::vision_completion(self, prompt, mime_type, image_base64).await
    }

    async fn text_completion(&self, prompt: &str) -> Result<String, GeminiError> {
        GeminiClient::text_completion(self, prompt).await
    }
}

/// Generative Language API client
pub struct GeminiClient {
    http_client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, GeminiError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GeminiError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            api_key,
            base_url: GEMINI_BASE_URL.to_string(),
        })
    }

    /// Override the API base URL (test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Vision completion: fixed instruction prompt plus an inline image.
    pub async fn vision_completion(
        &self,
        prompt: &str,
        mime_type: &str,
        image_base64: &str,
    ) -> Result<String, GeminiError> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![
                    Part {
                        text: Some(prompt.to_string()),
                        inline_data: None,
                    },
                    Part {
                        text: None,
                        inline_data: Some(InlineData {
                            mime_type: mime_type.to_string(),
                            data: image_base64.to_string(),
                        }),
                    },
                ],
            }],
        };

        self.generate(VISION_MODEL, &request).await
    }

    /// Text-only completion.
    pub async fn text_completion(&self, prompt: &str) -> Result<String, GeminiError> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                    inline_data: None,
                }],
            }],
        };

        self.generate(TEXT_MODEL, &request).await
    }

    async fn generate(
        &self,
        model: &str,
        request: &GenerateRequest,
    ) -> Result<String, GeminiError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        );

        debug!(model = %model, "Querying Generative Language API");

        let response = self
            .http_client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| GeminiError::NetworkError(e.to_string()))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(GeminiError::ApiError(status.as_u16(), error_text));
        }

        match response.json::<GenerateResponse>().await {
            Ok(body) => {
                let text = body.completion_text();
                if text.is_empty() {
                    warn!(model = %model, "completion response carried no candidate text");
                }
                Ok(text)
            }
            Err(e) => {
                warn!(model = %model, error = %e, "completion body undecodable, treating as empty");
                Ok(String::new())
            }
        }
    }
}
