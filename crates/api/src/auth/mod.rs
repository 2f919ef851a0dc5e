//! Credential verification and token lifecycle.

pub mod password;
pub mod tokens;
