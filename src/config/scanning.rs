//! Page fetching configuration for feature extraction

use serde::{Deserialize, Serialize};

use super::DEFAULT_USER_AGENT;

/// Feature extraction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanningConfig {
    /// User agent string
    pub user_agent: String,
    /// Budget for fetching the target page, redirects included (seconds)
    pub page_timeout_secs: u64,
    /// Budget for the robots.txt check (seconds)
    pub robots_timeout_secs: u64,
    /// Maximum redirect hops before the fetch is abandoned
    pub max_redirects: usize,
    /// Maximum response size (bytes)
    pub max_content_size: usize,
}

impl Default for ScanningConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            page_timeout_secs: 5,
            robots_timeout_secs: 3,
            max_redirects: 10,
            max_content_size: 10 * 1024 * 1024, // 10 MB
        }
    }
}
