//! Identifier types

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{RelayError, RelayResult};

/// Validated user identifier.
///
/// Authentication happens before the relay sees a connection, so this only
/// guards against identifiers that would poison the registry: empty strings,
/// the `undefined`/`null` literals a browser sends for a missing user, control
/// characters and oversized values.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Longest identifier accepted, in bytes
    pub const MAX_LEN: usize = 128;

    /// Parse a raw identifier, trimming surrounding whitespace
    pub fn parse(raw: &str) -> RelayResult<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(RelayError::MissingUserId);
        }
        if trimmed == "undefined"
            || trimmed == "null"
            || trimmed.len() > Self::MAX_LEN
            || trimmed.chars().any(char::is_control)
        {
            return Err(RelayError::InvalidUserId(raw.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Parse an optional identifier taken from connection metadata
    pub fn from_param(raw: Option<&str>) -> RelayResult<Self> {
        raw.map_or(Err(RelayError::MissingUserId), Self::parse)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for UserId {
    type Error = RelayError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0
    }
}

impl Borrow<str> for UserId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque handle id minted for every accepted connection; never reused
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn generate() -> Self {
        Self(format!("conn_{}", uuid::Uuid::now_v7().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ConnectionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
