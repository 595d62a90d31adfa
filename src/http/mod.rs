//! HTTP server module
//!
//! This module handles HTTP request routing and handling:
//! - Axum router with the conversion endpoints
//! - Request handlers and API error mapping
//! - CORS and trace middleware

pub mod handlers;
pub mod routes;

pub use routes::create_router;
