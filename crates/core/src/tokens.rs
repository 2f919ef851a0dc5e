//! Opaque token generation and hashing.
//!
//! A token's plaintext is handed to the client exactly once. Storage only
//! ever sees the SHA-256 digest, which is cheap enough to recompute on every
//! authenticated request (unlike the slow password hash).

use std::fmt;

use data_encoding::BASE32_NOPAD;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::types::{DbId, Timestamp};
use crate::validation::Validator;

/// Random bytes per token.
pub const TOKEN_ENTROPY_BYTES: usize = 16;

/// Length of the base-32 plaintext for [`TOKEN_ENTROPY_BYTES`] of entropy.
pub const TOKEN_PLAINTEXT_LEN: usize = 26;

/// What an issued token may be used for. The two never substitute for
/// each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Activation,
    Authentication,
}

impl Scope {
    /// Value stored in the `tokens.scope` column.
    pub const fn as_str(self) -> &'static str {
        match self {
            Scope::Activation => "activation",
            Scope::Authentication => "authentication",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// SHA-256 digest of a token plaintext.
pub type TokenHash = [u8; 32];

/// A freshly issued token. Only `token` and `expiry` are serialized.
#[derive(Clone, Serialize)]
pub struct Token {
    #[serde(rename = "token")]
    pub plaintext: String,
    #[serde(skip)]
    pub hash: TokenHash,
    #[serde(skip)]
    pub user_id: DbId,
    pub expiry: Timestamp,
    #[serde(skip)]
    pub scope: Scope,
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("plaintext", &"[redacted]")
            .field("user_id", &self.user_id)
            .field("expiry", &self.expiry)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

/// Generate a token for `user_id` valid until `now + ttl`.
///
/// Nothing is persisted here; the caller must store the hash before
/// returning the plaintext to anyone.
pub fn generate_token(
    user_id: DbId,
    ttl: chrono::Duration,
    scope: Scope,
    now: Timestamp,
) -> Token {
    let mut random = [0u8; TOKEN_ENTROPY_BYTES];
    rand::rng().fill_bytes(&mut random);

    let plaintext = BASE32_NOPAD.encode(&random);
    let hash = hash_token(&plaintext);

    Token {
        plaintext,
        hash,
        user_id,
        expiry: now + ttl,
        scope,
    }
}

pub fn hash_token(plaintext: &str) -> TokenHash {
    Sha256::digest(plaintext.as_bytes()).into()
}

pub fn validate_token_plaintext(v: &mut Validator, plaintext: &str) {
    v.check(!plaintext.is_empty(), "token", "must be provided");
    v.check(
        plaintext.len() == TOKEN_PLAINTEXT_LEN,
        "token",
        "must be 26 bytes long",
    );
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;

    #[test]
    fn generated_token_shape() {
        let now = Utc::now();
        let token = generate_token(7, Duration::hours(24), Scope::Authentication, now);

        assert_eq!(token.plaintext.len(), TOKEN_PLAINTEXT_LEN);
        assert!(token
            .plaintext
            .bytes()
            .all(|b| b.is_ascii_uppercase() || (b'2'..=b'7').contains(&b)));
        let raw = BASE32_NOPAD
            .decode(token.plaintext.as_bytes())
            .expect("plaintext should be unpadded base-32");
        assert_eq!(raw.len(), TOKEN_ENTROPY_BYTES);
        assert_eq!(token.hash, hash_token(&token.plaintext));
        assert_eq!(token.user_id, 7);
        assert_eq!(token.expiry, now + Duration::hours(24));
        assert_eq!(token.scope, Scope::Authentication);
    }

    #[test]
    fn tokens_are_unique() {
        let now = Utc::now();
        let a = generate_token(1, Duration::hours(1), Scope::Activation, now);
        let b = generate_token(1, Duration::hours(1), Scope::Activation, now);
        assert_ne!(a.plaintext, b.plaintext);
        assert_ne!(a.hash, b.hash);
    }

    #[test]
    fn hash_is_deterministic_sha256() {
        // SHA-256("") is a well-known constant.
        let empty = hash_token("");
        assert_eq!(empty[..4], [0xe3, 0xb0, 0xc4, 0x42]);
        assert_eq!(hash_token("ABC"), hash_token("ABC"));
        assert_ne!(hash_token("ABC"), hash_token("ABD"));
    }

    #[test]
    fn serialization_exposes_only_token_and_expiry() {
        let token = generate_token(42, Duration::hours(1), Scope::Authentication, Utc::now());
        let json = serde_json::to_value(&token).unwrap();
        let obj = json.as_object().unwrap();

        assert_eq!(obj.len(), 2);
        assert_eq!(obj["token"], token.plaintext.as_str());
        assert!(obj.contains_key("expiry"));
    }

    #[test]
    fn debug_redacts_plaintext() {
        let token = generate_token(42, Duration::hours(1), Scope::Authentication, Utc::now());
        let rendered = format!("{token:?}");
        assert!(!rendered.contains(&token.plaintext));
        assert!(rendered.contains("[redacted]"));
    }

    #[test]
    fn scope_strings() {
        assert_eq!(Scope::Activation.as_str(), "activation");
        assert_eq!(Scope::Authentication.to_string(), "authentication");
        assert_eq!(
            serde_json::to_string(&Scope::Authentication).unwrap(),
            r#""authentication""#
        );
    }

    #[test]
    fn plaintext_validation() {
        let mut v = Validator::new();
        validate_token_plaintext(&mut v, "ABCDEFGHIJKLMNOPQRSTUVWXYZ");
        assert!(v.valid());

        let mut v = Validator::new();
        validate_token_plaintext(&mut v, "");
        assert_eq!(v.errors().get("token"), Some("must be provided"));

        let mut v = Validator::new();
        validate_token_plaintext(&mut v, "TOO-SHORT");
        assert_eq!(v.errors().get("token"), Some("must be 26 bytes long"));
    }
}
