//! Card identifier

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::UidParseError;

/// Unique identifier of a card, as upper-case hexadecimal text
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardUid(String);

impl CardUid {
    /// Build an identifier from the raw UID bytes reported by the reader
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, UidParseError> {
        if bytes.is_empty() {
            return Err(UidParseError::Empty);
        }
        Ok(Self(hex::encode_upper(bytes)))
    }

    /// Identifier as text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for CardUid {
    type Err = UidParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(UidParseError::Empty);
        }
        let bytes = hex::decode(s)?;
        Self::from_bytes(&bytes)
    }
}

impl fmt::Display for CardUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
