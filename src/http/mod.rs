//! HTTP API Server Module
//!
//! REST API in front of feature extraction and model dispatch.

pub mod auth;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod types;

pub use handlers::AppState;
pub use routes::create_router;
pub use server::HttpServer;
