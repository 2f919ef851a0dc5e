//! Movie runtime in minutes, carried on the wire as `"<n> mins"`.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The only accepted unit word.
const UNIT: &str = "mins";

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RuntimeError {
    #[error("invalid runtime format")]
    InvalidFormat,
}

/// Runtime in whole minutes.
///
/// Negative values decode successfully; nothing in the text form rules them
/// out, and callers that care must range-check separately.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Runtime(pub i32);

impl Runtime {
    pub fn minutes(self) -> i32 {
        self.0
    }
}

impl From<i32> for Runtime {
    fn from(minutes: i32) -> Self {
        Runtime(minutes)
    }
}

impl fmt::Display for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {UNIT}", self.0)
    }
}

impl FromStr for Runtime {
    type Err = RuntimeError;

    /// Parse the unquoted text form. Exactly two single-space separated
    /// tokens, the second being `mins`; no partial recovery.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(' ').collect();
        let [number, unit] = parts.as_slice() else {
            return Err(RuntimeError::InvalidFormat);
        };
        if *unit != UNIT {
            return Err(RuntimeError::InvalidFormat);
        }
        number
            .parse::<i32>()
            .map(Runtime)
            .map_err(|_| RuntimeError::InvalidFormat)
    }
}

impl Serialize for Runtime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

struct RuntimeVisitor;

impl Visitor<'_> for RuntimeVisitor {
    type Value = Runtime;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(r#"a string of the form "<minutes> mins""#)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        v.parse().map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, _: i64) -> Result<Self::Value, E> {
        Err(E::custom(RuntimeError::InvalidFormat))
    }

    fn visit_u64<E: de::Error>(self, _: u64) -> Result<Self::Value, E> {
        Err(E::custom(RuntimeError::InvalidFormat))
    }
}

impl<'de> Deserialize<'de> for Runtime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_str(RuntimeVisitor)
    }
}
