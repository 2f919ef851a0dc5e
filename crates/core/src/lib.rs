//! Domain logic for the movie catalog service.
//!
//! Everything here is pure: no database, no HTTP. The `db` and `api` crates
//! build on these types for persistence and transport.

pub mod error;
pub mod filters;
pub mod permissions;
pub mod runtime;
pub mod tokens;
pub mod types;
pub mod validation;
