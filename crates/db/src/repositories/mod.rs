//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that take
//! a pool (or, where a method must run inside a caller's transaction, any
//! Postgres executor) as the first argument.

pub mod movie_repo;
pub mod permission_repo;
pub mod token_repo;
pub mod user_repo;

pub use movie_repo::MovieRepo;
pub use permission_repo::PermissionRepo;
pub use token_repo::TokenRepo;
pub use user_repo::UserRepo;
