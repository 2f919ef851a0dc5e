//! Domain model structs and DTOs.
//!
//! Each submodule contains a `FromRow` entity struct matching the database
//! row plus any insert/update DTOs.

pub mod movie;
pub mod user;
