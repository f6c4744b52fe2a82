//! API Module
//!
//! HTTP handlers and routing for the lookup service REST API.
//!
//! # Endpoints
//! - `GET /user?id=<id>` - Look up a user by id
//! - `GET /health` - Health check endpoint
//! - `GET /config` - Configuration in use
//! - `GET /metrics` - Plain-text metrics report

pub mod handlers;
pub mod routes;
pub mod server;

pub use handlers::*;
pub use routes::create_router;
pub use server::serve_and_close;
