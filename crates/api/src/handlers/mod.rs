pub mod health;
pub mod movies;
pub mod tokens;
pub mod users;
