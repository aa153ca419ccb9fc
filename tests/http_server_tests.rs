//! HTTP server and routing integration tests
//!
//! Drives the full router with in-memory fakes behind the pipeline trait
//! seams, so no network access is needed.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use verdant_ai::services::{
    CompletionApi, DiseaseScanner, GeminiError, PlantIdentifier,
};
use verdant_ai::{build_router, AppState};

/// Completion fake with fixed vision/text answers.
struct FakeCompletions {
    vision: Result<String, u16>,
    text: Result<String, u16>,
}

#[async_trait]
impl CompletionApi for FakeCompletions {
    async fn vision_completion(
        &self,
        _prompt: &str,
        _mime_type: &str,
        _image_base64: &str,
    ) -> Result<String, GeminiError> {
        self.vision
            .clone()
            .map_err(|status| GeminiError::ApiError(status, "upstream error".to_string()))
    }

    async fn text_completion(&self, _prompt: &str) -> Result<String, GeminiError> {
        self.text
            .clone()
            .map_err(|status| GeminiError::ApiError(status, "upstream error".to_string()))
    }
}

fn test_app_state(vision: Result<&str, u16>, text: Result<&str, u16>) -> AppState {
    let completions = Arc::new(FakeCompletions {
        vision: vision.map(str::to_string),
        text: text.map(str::to_string),
    });
    let scanner = DiseaseScanner::new(None, completions.clone());
    let identifier = PlantIdentifier::new(completions);
    AppState::new(scanner, identifier)
}

const BOUNDARY: &str = "verdant-test-boundary";

/// Build a multipart/form-data body with a single `image` file field.
fn image_upload_request(uri: &str, image: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        b"Content-Disposition: form-data; name=\"image\"; filename=\"leaf.jpg\"\r\n",
    );
    body.extend_from_slice(b"Content-Type: image/jpeg\r\n\r\n");
    body.extend_from_slice(image);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_endpoint_reports_service_identity() {
    let app = build_router(test_app_state(Ok("unused"), Ok("unused")));

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "verdant-ai");
    assert!(body.get("last_error").is_none());
}

#[tokio::test]
async fn test_scan_returns_normalized_diagnosis() {
    let app = build_router(test_app_state(
        Ok("Analysis follows.\n\
            {\"disease\":\"Leaf Spot\",\"confidence\":0.9,\"severity\":\"mild\",\
            \"recoveryPlan\":\"Remove affected leaves.\"}"),
        Ok("unused"),
    ));

    let response = app
        .oneshot(image_upload_request("/api/scan-plant-health", b"fake jpeg"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["disease"], "Leaf Spot");
    assert_eq!(body["confidence"], 0.9);
    assert_eq!(body["severity"], "mild");
    assert_eq!(body["recoveryPlan"], "Remove affected leaves.");
}

#[tokio::test]
async fn test_scan_without_image_field_is_bad_request() {
    let app = build_router(test_app_state(Ok("unused"), Ok("unused")));

    // Multipart body with a field the endpoint does not want
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(b"Content-Disposition: form-data; name=\"note\"\r\n\r\nhello\r\n");
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    let request = Request::builder()
        .method("POST")
        .uri("/api/scan-plant-health")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
    assert_eq!(body["error"]["message"], "No image provided");
}

#[tokio::test]
async fn test_scan_upstream_outage_is_generic_failure() {
    let state = test_app_state(Err(503), Ok("unused"));
    let app = build_router(state.clone());

    let response = app
        .clone()
        .oneshot(image_upload_request("/api/scan-plant-health", b"fake jpeg"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "INTERNAL_ERROR");
    assert_eq!(body["error"]["message"], "Failed to scan plant health");

    // The failure is recorded for the health endpoint's diagnostics
    let health = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let health_body = json_body(health).await;
    assert!(health_body["last_error"]
        .as_str()
        .unwrap()
        .contains("unavailable"));
}

#[tokio::test]
async fn test_identify_returns_species_shape() {
    let app = build_router(test_app_state(
        Ok("{\"commonName\":\"Monstera\",\"scientificName\":\"Monstera deliciosa\",\
            \"careInstructions\":\"Bright indirect light.\",\"confidence\":0.95}"),
        Ok("unused"),
    ));

    let response = app
        .oneshot(image_upload_request("/api/identify-plant", b"fake jpeg"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["species"], "Monstera (Monstera deliciosa)");
    assert_eq!(body["confidence"], 0.95);
    assert_eq!(body["careInstructions"], "Bright indirect light.");
}

#[tokio::test]
async fn test_identify_prose_completion_still_succeeds() {
    let app = build_router(test_app_state(
        Ok("Looks like a fern. Keep it humid."),
        Ok("unused"),
    ));

    let response = app
        .oneshot(image_upload_request("/api/identify-plant", b"fake jpeg"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["species"], "Unknown Plant (Species identification needed)");
    assert_eq!(body["careInstructions"], "Looks like a fern. Keep it humid.");
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let app = build_router(test_app_state(Ok("unused"), Ok("unused")));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/does-not-exist")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
