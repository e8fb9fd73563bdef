//! HTTP API Request/Response Types
//!
//! JSON-serializable types for the HTTP API. The manual scan body is the
//! `FeatureVector` itself and scan responses are plain model-to-label maps.

use serde::{Deserialize, Serialize};

/// Automatic scan request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoScanRequest {
    /// URL to extract features from
    pub url: String,
}

/// Root endpoint response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelloResponse {
    #[serde(rename = "Hello")]
    pub hello: String,
}

impl Default for HelloResponse {
    fn default() -> Self {
        Self {
            hello: "World".to_string(),
        }
    }
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub detail: String,
}

impl ErrorResponse {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }

    pub fn scan_failed(cause: impl std::fmt::Display) -> Self {
        Self::new(format!("An error occurred while scanning the URL: {}", cause))
    }
}
