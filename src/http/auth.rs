//! HTTP API Authentication Middleware
//!
//! Requires a signed bearer token on every protected route.

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::debug;

use super::types::ErrorResponse;
use crate::auth::{AuthError, TokenAuthority};

/// Shared state for authentication
#[derive(Clone)]
pub struct AuthState {
    pub authority: Arc<TokenAuthority>,
}

impl AuthState {
    pub fn new(authority: Arc<TokenAuthority>) -> Self {
        Self { authority }
    }

    /// Validate an `Authorization` header value
    pub fn validate_header(&self, header_value: Option<&str>) -> Result<(), AuthError> {
        let token = header_value
            .and_then(bearer_token)
            .ok_or(AuthError::Missing)?;
        self.authority.verify(token).map(|claims| {
            debug!("Authenticated request for subject {}", claims.sub);
        })
    }
}

/// Extract the token from a `Bearer <token>` header value
fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Authentication middleware
pub async fn auth_middleware(
    State(auth): State<AuthState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    match auth.validate_header(auth_header) {
        Ok(()) => next.run(request).await,
        Err(e) => {
            let mut response = (StatusCode::UNAUTHORIZED, Json(ErrorResponse::new(e.to_string())))
                .into_response();
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, header::HeaderValue::from_static("Bearer"));
            response
        }
    }
}
