//! Bearer token configuration

use serde::{Deserialize, Serialize};

/// Environment variable that overrides the signing secret
pub const SECRET_ENV_VAR: &str = "PHISHSCAN_JWT_SECRET";

/// Minimum accepted secret length in bytes
pub const MIN_SECRET_LEN: usize = 16;

/// Token signing configuration
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HS256 signing secret
    pub secret: String,
    /// Lifetime of issued tokens in seconds.
    ///
    /// `None` issues tokens without an `exp` claim; they stay valid until
    /// the secret is rotated.
    pub token_ttl_secs: Option<u64>,
}

impl AuthConfig {
    /// Apply the secret from the environment, if set
    pub fn apply_env(&mut self) {
        if let Ok(secret) = std::env::var(SECRET_ENV_VAR) {
            if !secret.is_empty() {
                self.secret = secret;
            }
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret", &"<redacted>")
            .field("token_ttl_secs", &self.token_ttl_secs)
            .finish()
    }
}
