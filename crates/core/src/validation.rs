//! Field-level validation collector.
//!
//! Checks are accumulated rather than short-circuited so that a single
//! response can report every offending field. Only the first message per
//! field is kept.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Minimum password length in bytes.
pub const MIN_PASSWORD_BYTES: usize = 8;

/// Maximum password length in bytes.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Email address pattern (WHATWG "valid e-mail address").
pub static EMAIL_RX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .expect("email pattern is a valid regex")
});

/// Map of field name to human-readable message.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Message recorded for `field`, if any.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Build a single-field error set.
    pub fn single(field: &str, message: &str) -> Self {
        let mut errors = Self::default();
        errors.0.insert(field.to_string(), message.to_string());
        errors
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

/// Accumulates [`FieldErrors`].
#[derive(Debug, Default)]
pub struct Validator {
    errors: FieldErrors,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Record `message` for `field` unless the field already has one.
    pub fn add_error(&mut self, field: &str, message: &str) {
        self.errors
            .0
            .entry(field.to_string())
            .or_insert_with(|| message.to_string());
    }

    /// Record `message` for `field` when `ok` is false.
    pub fn check(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.add_error(field, message);
        }
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// `Ok(())` when no check failed, otherwise every collected violation.
    pub fn finish(self) -> Result<(), FieldErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

/// Exact membership test against a closed set.
pub fn permitted_value<T: PartialEq + ?Sized>(value: &T, permitted: &[&T]) -> bool {
    permitted.iter().any(|p| *p == value)
}

pub fn validate_email(v: &mut Validator, email: &str) {
    v.check(!email.is_empty(), "email", "must be provided");
    v.check(
        EMAIL_RX.is_match(email),
        "email",
        "must be a valid email address",
    );
}

/// Password rules applied before any credential lookup.
///
/// The upper bound keeps input within what the slow hash is tuned for.
pub fn validate_password_plaintext(v: &mut Validator, password: &str) {
    v.check(!password.is_empty(), "password", "must be provided");
    v.check(
        password.len() >= MIN_PASSWORD_BYTES,
        "password",
        "must be at least 8 bytes long",
    );
    v.check(
        password.len() <= MAX_PASSWORD_BYTES,
        "password",
        "must not be more than 72 bytes long",
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_message_per_field_wins() {
        let mut v = Validator::new();
        v.add_error("page", "must be greater than zero");
        v.add_error("page", "must be a maximum of 10 million");
        assert_eq!(v.errors().get("page"), Some("must be greater than zero"));
        assert_eq!(v.errors().len(), 1);
    }

    #[test]
    fn check_collects_every_failing_field() {
        let mut v = Validator::new();
        v.check(false, "email", "bad");
        v.check(true, "name", "unused");
        v.check(false, "password", "bad");
        let errors = v.finish().unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.get("name").is_none());
    }

    #[test]
    fn empty_validator_finishes_ok() {
        assert!(Validator::new().finish().is_ok());
    }

    #[test]
    fn permitted_value_is_exact_match() {
        assert!(permitted_value("title", &["id", "title"]));
        assert!(!permitted_value("Title", &["id", "title"]));
        assert!(!permitted_value("title ", &["id", "title"]));
    }

    #[test]
    fn email_rules() {
        let mut v = Validator::new();
        validate_email(&mut v, "alice@example.com");
        assert!(v.valid());

        let mut v = Validator::new();
        validate_email(&mut v, "");
        assert_eq!(v.errors().get("email"), Some("must be provided"));

        let mut v = Validator::new();
        validate_email(&mut v, "not-an-email");
        assert_eq!(v.errors().get("email"), Some("must be a valid email address"));
    }

    #[test]
    fn password_length_bounds() {
        let mut v = Validator::new();
        validate_password_plaintext(&mut v, "pa55word");
        assert!(v.valid(), "8 bytes is the minimum");

        let mut v = Validator::new();
        validate_password_plaintext(&mut v, "short");
        assert_eq!(
            v.errors().get("password"),
            Some("must be at least 8 bytes long")
        );

        let mut v = Validator::new();
        validate_password_plaintext(&mut v, &"x".repeat(73));
        assert_eq!(
            v.errors().get("password"),
            Some("must not be more than 72 bytes long")
        );
    }

    #[test]
    fn display_lists_fields_in_order() {
        let mut v = Validator::new();
        v.add_error("sort", "invalid sort value");
        v.add_error("page", "must be greater than zero");
        assert_eq!(
            v.errors().to_string(),
            "page: must be greater than zero, sort: invalid sort value"
        );
    }
}
