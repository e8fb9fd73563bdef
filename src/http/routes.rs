//! HTTP API Route Definitions

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use super::auth::{auth_middleware, AuthState};
use super::handlers::{self, AppState};

/// Create the API router with all routes
pub fn create_router(app_state: AppState, auth_state: AuthState) -> Router {
    // Protected routes
    let protected = Router::new()
        .route("/automatic_ai_scan", post(handlers::automatic_ai_scan))
        .route("/manual_ai_scan", post(handlers::manual_ai_scan))
        .route("/news_date", get(handlers::news_date))
        .layer(middleware::from_fn_with_state(auth_state, auth_middleware));

    Router::new()
        // Health check (no auth required)
        .route("/", get(handlers::root))
        .merge(protected)
        .with_state(app_state)
}
