//! HTTP API server for the paginated article index.
//!
//! This crate provides:
//! - List bootstrap, append, head lookup, and cascade delete endpoints
//! - Page read and whole-page replacement endpoints
//! - Prometheus metrics and a health check

pub mod bootstrap;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
