//! Prediction backend configuration

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Environment variable consulted when no access token is configured
pub const ACCESS_TOKEN_ENV_VAR: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";

/// BigQuery ML prediction configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionConfig {
    /// BigQuery REST API base URL
    pub endpoint: String,
    /// Project the prediction queries are billed to
    pub project_id: String,
    /// OAuth access token (falls back to `GOOGLE_OAUTH_ACCESS_TOKEN`)
    pub access_token: Option<String>,
    /// Per-query timeout in seconds
    pub timeout_secs: u64,
    /// Models scored at the same time
    pub max_concurrent_models: usize,
    /// Model name to fully qualified model identifier
    pub models: BTreeMap<String, String>,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://bigquery.googleapis.com/bigquery/v2".to_string(),
            project_id: String::new(),
            access_token: None,
            timeout_secs: 30,
            max_concurrent_models: 4,
            models: BTreeMap::new(),
        }
    }
}

impl PredictionConfig {
    /// Resolve the access token from config or environment
    pub fn resolve_access_token(&self) -> Option<String> {
        self.access_token
            .clone()
            .filter(|t| !t.is_empty())
            .or_else(|| std::env::var(ACCESS_TOKEN_ENV_VAR).ok().filter(|t| !t.is_empty()))
    }
}

impl std::fmt::Debug for PredictionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredictionConfig")
            .field("endpoint", &self.endpoint)
            .field("project_id", &self.project_id)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .field("max_concurrent_models", &self.max_concurrent_models)
            .field("models", &self.models)
            .finish()
    }
}

/// Check that a model identifier is a plain `[project.]dataset.model` path.
///
/// Identifiers are spliced into the query text as a quoted identifier, so
/// anything outside `[A-Za-z0-9_-]` segments is refused.
pub fn is_valid_model_id(model_id: &str) -> bool {
    let segments: Vec<&str> = model_id.split('.').collect();
    (2..=3).contains(&segments.len())
        && segments.iter().all(|s| {
            !s.is_empty()
                && s
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        })
}
