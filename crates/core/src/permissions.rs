//! Permission codes attached to users.
//!
//! Codes are opaque strings compared by exact match. There is no hierarchy
//! and no wildcard: `movies:write` does not imply `movies:read`.

use serde::Serialize;

pub const MOVIES_READ: &str = "movies:read";
pub const MOVIES_WRITE: &str = "movies:write";

/// Codes granted to a newly activated account.
pub const DEFAULT_GRANTS: &[&str] = &[MOVIES_READ];

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Permissions(Vec<String>);

impl Permissions {
    pub fn includes(&self, code: &str) -> bool {
        self.0.iter().any(|granted| granted == code)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<String> for Permissions {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Permissions(iter.into_iter().collect())
    }
}

impl From<Vec<String>> for Permissions {
    fn from(codes: Vec<String>) -> Self {
        Permissions(codes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn perms(codes: &[&str]) -> Permissions {
        codes.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn includes_exact_code() {
        let p = perms(&[MOVIES_READ]);
        assert!(p.includes(MOVIES_READ));
        assert!(!p.includes(MOVIES_WRITE));
    }

    #[test]
    fn no_wildcards_or_prefixes() {
        let p = perms(&["movies:*", "movies"]);
        assert!(!p.includes(MOVIES_READ));
        assert!(!perms(&[MOVIES_WRITE]).includes(MOVIES_READ));
    }

    #[test]
    fn empty_set_grants_nothing() {
        let p = Permissions::default();
        assert!(p.is_empty());
        assert!(!p.includes(""));
    }
}
