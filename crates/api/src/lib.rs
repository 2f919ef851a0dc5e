//! Marquee API server library.
//!
//! Exposes config, state, error handling, routes, and background tasks so
//! integration tests and the binary entrypoint share the same building
//! blocks.

pub mod auth;
pub mod background;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod notifications;
pub mod router;
pub mod routes;
pub mod state;
