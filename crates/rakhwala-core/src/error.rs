//! Error types for the safety workflow.
//!
//! [`SafetyError`] is the user-facing taxonomy: every failure the App shows
//! (or deliberately hides) maps to one of its variants. Lower layers keep
//! their own types ([`StorageError`], [`RemoteError`], [`RouteError`]) and
//! convert at the boundary.

use rakhwala_proto::ProtocolError;
use thiserror::Error;

use crate::{Capability, remote::RemoteError, storage::StorageError};

/// Failures of a workflow step.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SafetyError {
    /// User declined a capability prompt. Aborts the current step only.
    #[error("{0} permission not granted")]
    PermissionDenied(Capability),

    /// No location fix available. Aborts SOS and route flows.
    #[error("unable to retrieve location")]
    NoLocationFix,

    /// Remote store or HTTP failure. Not retried.
    #[error("network failure: {0}")]
    Network(String),

    /// No signed-in user. Contact operations abort silently.
    #[error("not signed in")]
    AuthRequired,

    /// Local persisted state could not be read or written.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Data failed validation or decoding.
    #[error("invalid data: {0}")]
    Protocol(#[from] ProtocolError),

    /// Platform service (telephony, speech, navigation) failed.
    #[error("{0}")]
    Platform(String),
}

impl SafetyError {
    /// Returns true if the failure is logged but never shown to the user.
    pub fn is_silent(&self) -> bool {
        matches!(self, Self::AuthRequired)
    }

    /// Returns true if the same request may succeed later unchanged.
    ///
    /// Nothing in the workflow retries automatically; the status message
    /// asks the user to try again instead.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) | Self::NoLocationFix => true,
            Self::Storage(err) => err.is_transient(),
            _ => false,
        }
    }
}

impl From<RemoteError> for SafetyError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::Decode(message) => Self::Protocol(ProtocolError::Decode(message)),
            other => Self::Network(other.to_string()),
        }
    }
}

/// Route query failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// Route API answered with a non-success HTTP status.
    #[error("route service returned HTTP {0}")]
    Status(u16),

    /// Request never completed (connection refused, TLS, timeout).
    #[error("{0}")]
    Transport(String),

    /// Response body was not a valid route envelope.
    #[error("invalid route response: {0}")]
    Decode(String),
}

impl From<ProtocolError> for RouteError {
    fn from(err: ProtocolError) -> Self {
        Self::Decode(err.to_string())
    }
}
