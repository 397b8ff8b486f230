//! Protocol-level validation and decoding errors.

use thiserror::Error;

/// Errors raised while validating or decoding Rakhwala data.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProtocolError {
    /// Access code is not a six digit number in `[100000, 999999]`.
    #[error("invalid access code: {0:?}")]
    InvalidAccessCode(String),

    /// A required text field was empty after trimming.
    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    /// Coordinate is not finite or outside the WGS84 range.
    #[error("invalid coordinate: ({latitude}, {longitude})")]
    InvalidCoordinate {
        /// Offending latitude
        latitude: f64,
        /// Offending longitude
        longitude: f64,
    },

    /// Store path is empty or contains a forbidden character.
    #[error("invalid store path: {0:?}")]
    InvalidPath(String),

    /// Record was written by a newer schema than this build understands.
    #[error("unsupported schema version {found} (supported up to {supported})")]
    UnsupportedSchema {
        /// Version tag found on the record
        found: u32,
        /// Highest version this build reads
        supported: u32,
    },

    /// Payload could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<serde_json::Error> for ProtocolError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}
