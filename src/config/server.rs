//! HTTP API server configuration

use serde::{Deserialize, Serialize};

/// Timestamp served by `GET /news_date`
pub const DEFAULT_NEWS_TIMESTAMP: i64 = 1_734_238_800;

/// HTTP API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address for HTTP server (e.g., "0.0.0.0:8000")
    pub listen_addr: String,
    /// Enable permissive CORS (browser-based clients)
    pub cors_enabled: bool,
    /// Value returned by the news date endpoint
    pub news_timestamp: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8000".to_string(),
            cors_enabled: true,
            news_timestamp: DEFAULT_NEWS_TIMESTAMP,
        }
    }
}
