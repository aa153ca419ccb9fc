//! verdant-ai - Plant Analysis Microservice
//!
//! AI-analysis module of the Verdant plant-care application. Exposes two
//! upload endpoints: disease scanning (multi-stage fallback pipeline over
//! an optional primary ML backend and the Generative Language API) and
//! plant identification (single generative-AI call). Persistence,
//! authentication, and file storage belong to other modules; this service
//! is stateless per request.

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod types;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

use crate::config::AiConfig;
use crate::services::{DiseaseScanner, GeminiClient, PlantIdentifier, PrimaryBackendClient};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Disease-scan orchestrator
    pub scanner: Arc<DiseaseScanner>,
    /// Plant identifier
    pub identifier: Arc<PlantIdentifier>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last pipeline error for diagnostics
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(scanner: DiseaseScanner, identifier: PlantIdentifier) -> Self {
        Self {
            scanner: Arc::new(scanner),
            identifier: Arc::new(identifier),
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Build state from resolved configuration.
    pub fn from_config(config: &AiConfig) -> anyhow::Result<Self> {
        let timeout = Duration::from_secs(config.request_timeout_secs);

        let gemini: Arc<dyn services::CompletionApi> =
            Arc::new(GeminiClient::new(config.gemini_api_key.clone(), timeout)?);

        let primary: Option<Arc<dyn services::PredictBackend>> = match &config.primary_backend_url
        {
            Some(url) => Some(Arc::new(PrimaryBackendClient::new(url.clone(), timeout)?)),
            None => None,
        };

        let scanner = DiseaseScanner::new(primary, gemini.clone());
        let identifier = PlantIdentifier::new(gemini);

        Ok(Self::new(scanner, identifier))
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::scan_routes())
        .merge(api::identify_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
