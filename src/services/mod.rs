//! Analysis services
//!
//! External API clients and the pipelines composed from them.

pub mod diagnosis;
pub mod gemini_client;
pub mod identifier;
pub mod ml_backend_client;
pub mod response_parser;

pub use diagnosis::{DiseaseScanner, ScanError};
pub use gemini_client::{CompletionApi, GeminiClient, GeminiError};
pub use identifier::{IdentifyError, PlantIdentifier};
pub use ml_backend_client::{BackendError, PredictBackend, PrimaryBackendClient};
