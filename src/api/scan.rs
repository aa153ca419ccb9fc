//! Disease-scan endpoint

use axum::{extract::Multipart, extract::State, routing::post, Json, Router};
use tracing::error;

use crate::api::read_image_field;
use crate::error::{ApiError, ApiResult};
use crate::types::DiagnosisResult;
use crate::AppState;

/// POST /api/scan-plant-health
///
/// Multipart form with a required `image` file field. Returns the
/// normalized diagnosis, or a single generic failure when the whole
/// fallback chain is unavailable.
pub async fn scan_plant_health(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<DiagnosisResult>> {
    let image = read_image_field(&mut multipart).await?;

    match state.scanner.scan(&image.mime_type, &image.bytes).await {
        Ok(result) => Ok(Json(result)),
        Err(e) => {
            error!(error = %e, "Disease scan failed");
            *state.last_error.write().await = Some(e.to_string());
            Err(ApiError::Internal("Failed to scan plant health".to_string()))
        }
    }
}

/// Build disease-scan routes
pub fn scan_routes() -> Router<AppState> {
    Router::new().route("/api/scan-plant-health", post(scan_plant_health))
}
