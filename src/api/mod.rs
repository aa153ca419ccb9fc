//! HTTP API handlers

mod health;
mod identify;
mod scan;

pub use health::health_routes;
pub use identify::identify_routes;
pub use scan::scan_routes;

use crate::error::ApiError;
use axum::body::Bytes;
use axum::extract::Multipart;

/// Uploaded image: raw bytes plus the declared MIME type.
pub(crate) struct ImageUpload {
    pub mime_type: String,
    pub bytes: Bytes,
}

/// Read the required `image` file field from a multipart form.
///
/// Both upload endpoints share this contract; a missing or empty field is
/// a 400 with the same message the web client already expects.
pub(crate) async fn read_image_field(multipart: &mut Multipart) -> Result<ImageUpload, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() != Some("image") {
            continue;
        }

        let mime_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read image field: {}", e)))?;

        if bytes.is_empty() {
            break;
        }

        return Ok(ImageUpload { mime_type, bytes });
    }

    Err(ApiError::BadRequest("No image provided".to_string()))
}
