//! Configuration for phishscan

mod auth;
mod logging;
mod prediction;
mod scanning;
mod server;

pub use auth::{AuthConfig, MIN_SECRET_LEN, SECRET_ENV_VAR};
pub use logging::{LogFormat, LogLevel, LoggingConfig};
pub use prediction::{is_valid_model_id, PredictionConfig, ACCESS_TOKEN_ENV_VAR};
pub use scanning::ScanningConfig;
pub use server::{ServerConfig, DEFAULT_NEWS_TIMESTAMP};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;

/// Default user agent for page and robots.txt requests
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (compatible; phishscan/0.1; +https://github.com/phishscan)";

/// Upper bound for the page fetch budget (seconds)
const MAX_PAGE_TIMEOUT_SECS: u64 = 5;

/// Upper bound for the robots.txt check budget (seconds)
const MAX_ROBOTS_TIMEOUT_SECS: u64 = 3;

/// Main configuration for the phishscan service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP API server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Bearer token configuration
    #[serde(default)]
    pub auth: AuthConfig,
    /// Feature extraction configuration
    #[serde(default)]
    pub scanning: ScanningConfig,
    /// Prediction backend configuration
    #[serde(default)]
    pub prediction: PredictionConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// Environment overrides are applied on load, so a secret supplied only
    /// through `PHISHSCAN_JWT_SECRET` is seen by later validation.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e))?;
        let mut config: Config = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file '{}': {}", path.display(), e))?;
        config.auth.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` when it exists, otherwise start from defaults
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            return Self::load(path);
        }
        let mut config = Config::default();
        config.auth.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Validate the fields every command depends on.
    ///
    /// Collects all validation errors and reports them together. The signing
    /// secret and the model table are only required by the commands that use
    /// them, see [`Config::validate_signing`] and [`Config::validate_for_serving`].
    pub fn validate(&self) -> Result<()> {
        report(self.structural_errors())
    }

    /// Validate everything needed to issue or verify tokens
    pub fn validate_signing(&self) -> Result<()> {
        let mut errors = self.structural_errors();
        errors.extend(self.signing_errors());
        report(errors)
    }

    /// Validate everything needed to run the HTTP API
    pub fn validate_for_serving(&self) -> Result<()> {
        let mut errors = self.structural_errors();
        errors.extend(self.signing_errors());
        if self.prediction.models.is_empty() {
            errors.push("at least one model must be configured under [prediction.models]".to_string());
        }
        report(errors)
    }

    fn signing_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.auth.secret.len() < MIN_SECRET_LEN {
            errors.push(format!(
                "auth secret must be at least {} bytes (set [auth] secret or {})",
                MIN_SECRET_LEN, SECRET_ENV_VAR
            ));
        }
        errors
    }

    fn structural_errors(&self) -> Vec<String> {
        let mut errors: Vec<String> = Vec::new();

        // Server validation
        if self.server.listen_addr.parse::<SocketAddr>().is_err() {
            errors.push(format!(
                "listen_addr '{}' is not a valid socket address",
                self.server.listen_addr
            ));
        }

        // Auth validation
        if self.auth.token_ttl_secs == Some(0) {
            errors.push("token_ttl_secs must be positive when set".to_string());
        }

        // Scanning validation
        if self.scanning.page_timeout_secs == 0 || self.scanning.page_timeout_secs > MAX_PAGE_TIMEOUT_SECS {
            errors.push(format!(
                "page_timeout_secs must be between 1 and {}",
                MAX_PAGE_TIMEOUT_SECS
            ));
        }
        if self.scanning.robots_timeout_secs == 0
            || self.scanning.robots_timeout_secs > MAX_ROBOTS_TIMEOUT_SECS
        {
            errors.push(format!(
                "robots_timeout_secs must be between 1 and {}",
                MAX_ROBOTS_TIMEOUT_SECS
            ));
        }
        if self.scanning.max_redirects == 0 {
            errors.push("max_redirects must be positive".to_string());
        }
        if self.scanning.max_content_size == 0 {
            errors.push("max_content_size must be positive".to_string());
        }

        // Prediction validation
        if self.prediction.timeout_secs == 0 {
            errors.push("prediction timeout_secs must be positive".to_string());
        }
        if self.prediction.max_concurrent_models == 0 {
            errors.push("max_concurrent_models must be positive".to_string());
        }
        if !self.prediction.models.is_empty() && self.prediction.project_id.is_empty() {
            errors.push("project_id must be set when models are configured".to_string());
        }
        for (name, model_id) in &self.prediction.models {
            if !is_valid_model_id(model_id) {
                errors.push(format!(
                    "model '{}' has invalid identifier '{}' (expected [project.]dataset.model)",
                    name, model_id
                ));
            }
        }

        errors
    }
}

fn report(errors: Vec<String>) -> Result<()> {
    if errors.is_empty() {
        Ok(())
    } else {
        anyhow::bail!(
            "Configuration validation failed:\n  - {}",
            errors.join("\n  - ")
        );
    }
}
