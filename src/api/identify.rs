//! Plant-identification endpoint

use axum::{extract::Multipart, extract::State, routing::post, Json, Router};
use tracing::error;

use crate::api::read_image_field;
use crate::error::{ApiError, ApiResult};
use crate::types::IdentificationResult;
use crate::AppState;

/// POST /api/identify-plant
///
/// Multipart form with a required `image` file field.
pub async fn identify_plant(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<IdentificationResult>> {
    let image = read_image_field(&mut multipart).await?;

    match state.identifier.identify(&image.mime_type, &image.bytes).await {
        Ok(result) => Ok(Json(result)),
        Err(e) => {
            error!(error = %e, "Plant identification failed");
            *state.last_error.write().await = Some(e.to_string());
            Err(ApiError::Internal("Failed to identify plant".to_string()))
        }
    }
}

/// Build identification routes
pub fn identify_routes() -> Router<AppState> {
    Router::new().route("/api/identify-plant", post(identify_plant))
}
