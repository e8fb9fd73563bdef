//! Bearer token issuance and verification
//!
//! Tokens are compact HS256 JWTs. Whether they expire is decided by
//! configuration: without a TTL no `exp` claim is written and the token is
//! valid until the signing secret changes. There is no revocation list.

use base64::{engine::general_purpose, Engine as _};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

use crate::config::AuthConfig;

type HmacSha256 = Hmac<Sha256>;

/// Only algorithm accepted in token headers
const ALGORITHM: &str = "HS256";

/// Authentication failures, each with the detail shown to clients
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Not authenticated")]
    Missing,
    #[error("Invalid token")]
    Invalid,
    #[error("Token expired")]
    Expired,
    #[error("Invalid signing key")]
    InvalidKey,
}

/// Claims carried by a token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject the token was issued to
    pub sub: String,
    /// Issued-at, seconds since the epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    /// Expiry, seconds since the epoch; absent for unlimited tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    #[serde(default)]
    typ: Option<String>,
}

/// Signs and checks bearer tokens with a shared secret
#[derive(Clone)]
pub struct TokenAuthority {
    mac: HmacSha256,
    ttl_secs: Option<u64>,
}

impl TokenAuthority {
    /// Create an authority from the configured secret and TTL policy
    pub fn new(config: &AuthConfig) -> Result<Self, AuthError> {
        let mac = HmacSha256::new_from_slice(config.secret.as_bytes())
            .map_err(|_| AuthError::InvalidKey)?;
        Ok(Self {
            mac,
            ttl_secs: config.token_ttl_secs,
        })
    }

    /// Issue a token for `subject`
    pub fn issue(&self, subject: &str) -> String {
        self.issue_at(subject, chrono::Utc::now().timestamp())
    }

    /// Issue a token as if the current time were `now`
    pub fn issue_at(&self, subject: &str, now: i64) -> String {
        let claims = Claims {
            sub: subject.to_string(),
            iat: Some(now),
            exp: self.ttl_secs.map(|ttl| now.saturating_add(ttl as i64)),
        };
        let header = Header {
            alg: ALGORITHM.to_string(),
            typ: Some("JWT".to_string()),
        };

        // Serializing these plain structs cannot fail
        let header_b64 = encode_part(&serde_json::to_vec(&header).unwrap_or_default());
        let payload_b64 = encode_part(&serde_json::to_vec(&claims).unwrap_or_default());
        let signing_input = format!("{}.{}", header_b64, payload_b64);
        let signature = self.sign(&signing_input);

        format!("{}.{}", signing_input, signature)
    }

    /// Verify `token` against the current time
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify_at(token, chrono::Utc::now().timestamp())
    }

    /// Verify `token` as if the current time were `now`
    pub fn verify_at(&self, token: &str, now: i64) -> Result<Claims, AuthError> {
        let mut parts = token.split('.');
        let (Some(header_b64), Some(payload_b64), Some(signature_b64), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(AuthError::Invalid);
        };

        let signature = general_purpose::URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| AuthError::Invalid)?;
        let mut mac = self.mac.clone();
        mac.update(header_b64.as_bytes());
        mac.update(b".");
        mac.update(payload_b64.as_bytes());
        mac.verify_slice(&signature).map_err(|_| AuthError::Invalid)?;

        let header: Header = decode_part(header_b64)?;
        if header.alg != ALGORITHM {
            return Err(AuthError::Invalid);
        }

        let claims: Claims = decode_part(payload_b64)?;
        if let Some(exp) = claims.exp {
            if now >= exp {
                return Err(AuthError::Expired);
            }
        }

        Ok(claims)
    }

    fn sign(&self, signing_input: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(signing_input.as_bytes());
        encode_part(&mac.finalize().into_bytes())
    }
}

impl std::fmt::Debug for TokenAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenAuthority")
            .field("ttl_secs", &self.ttl_secs)
            .finish_non_exhaustive()
    }
}

fn encode_part(bytes: &[u8]) -> String {
    general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

fn decode_part<T: serde::de::DeserializeOwned>(part: &str) -> Result<T, AuthError> {
    let bytes = general_purpose::URL_SAFE_NO_PAD
        .decode(part)
        .map_err(|_| AuthError::Invalid)?;
    serde_json::from_slice(&bytes).map_err(|_| AuthError::Invalid)
}
