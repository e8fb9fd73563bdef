//! System handlers: root, news date

use axum::{extract::State, response::IntoResponse, Json};

use super::AppState;
use crate::http::types::HelloResponse;

/// Root endpoint, doubles as the health check
pub async fn root() -> impl IntoResponse {
    Json(HelloResponse::default())
}

/// Timestamp of the latest news item
pub async fn news_date(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.news_timestamp)
}
