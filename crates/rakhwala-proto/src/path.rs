//! Paths into the remote key-value store.
//!
//! Paths are `/`-separated segments without leading or trailing slashes.
//! Segments may not contain the characters the realtime database reserves
//! (`.`, `$`, `#`, `[`, `]`) or control characters.

use std::fmt;

use crate::{AccessCode, ContactId, ProtocolError, UserId};

const LOCATIONS: &str = "locations";
const USERS: &str = "users";
const CONTACTS: &str = "contacts";

/// A validated path into the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StorePath(String);

impl StorePath {
    /// Parse and validate a path.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidPath`] for empty paths, empty
    /// segments, or reserved characters.
    pub fn parse(path: &str) -> Result<Self, ProtocolError> {
        let trimmed = path.trim_matches('/');
        if trimmed.is_empty() || !trimmed.split('/').all(valid_segment) {
            return Err(ProtocolError::InvalidPath(path.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// `locations/<code>`: latest sample published under an access code.
    pub fn location(code: AccessCode) -> Self {
        Self(format!("{LOCATIONS}/{code}"))
    }

    /// `users/<user_id>/contacts`: all contacts of a user.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidPath`] if the user id contains a
    /// reserved character.
    pub fn contacts(user: &UserId) -> Result<Self, ProtocolError> {
        Self::parse(USERS)?.child(user.as_str())?.child(CONTACTS)
    }

    /// `users/<user_id>/contacts/<contact_id>`: a single contact entry.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidPath`] if either id contains a
    /// reserved character.
    pub fn contact(user: &UserId, id: &ContactId) -> Result<Self, ProtocolError> {
        Self::contacts(user)?.child(id.as_str())
    }

    /// Append one segment.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidPath`] if `segment` is not a valid
    /// single segment.
    pub fn child(&self, segment: &str) -> Result<Self, ProtocolError> {
        if !valid_segment(segment) {
            return Err(ProtocolError::InvalidPath(format!("{}/{segment}", self.0)));
        }
        Ok(Self(format!("{}/{segment}", self.0)))
    }

    /// Path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path segments from the root.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    /// Whether `self` equals `other` or lies above it.
    pub fn is_ancestor_of(&self, other: &StorePath) -> bool {
        other.0 == self.0 || other.0.starts_with(&format!("{}/", self.0))
    }

    /// Whether a write at `other` can change the value seen at `self`.
    pub fn overlaps(&self, other: &StorePath) -> bool {
        self.is_ancestor_of(other) || other.is_ancestor_of(self)
    }
}

impl fmt::Display for StorePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && !segment.chars().any(|c| matches!(c, '.' | '$' | '#' | '[' | ']' | '/') || c.is_control())
}
