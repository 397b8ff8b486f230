//! Device-local persisted state.
//!
//! Two values survive restarts: the auth session and the access code. The
//! trait is synchronous; both values are tiny and read once at startup.

mod memory;
mod redb;

use rakhwala_proto::{AccessCode, AuthSession};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use memory::MemoryLocalStore;

pub use self::redb::RedbLocalStore;

/// Local store failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Backing database could not be opened, read or written.
    #[error("I/O error: {0}")]
    Io(String),

    /// Stored bytes did not decode.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Value was written by a newer schema.
    #[error("unsupported schema version {found} (supported up to {supported})")]
    UnsupportedSchema {
        /// Version tag found on disk.
        found: u32,
        /// Newest version this build reads.
        supported: u32,
    },
}

impl StorageError {
    /// Returns true if retrying the operation might succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}

/// A persisted value tagged with the schema version that wrote it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Versioned<T> {
    /// Schema version at write time.
    pub version: u32,
    /// Payload.
    pub value: T,
}

impl<T> Versioned<T> {
    /// Tag `value` with the current schema version.
    pub fn current(value: T) -> Self {
        Self { version: rakhwala_proto::SCHEMA_VERSION, value }
    }

    /// Unwrap the payload, rejecting values from a newer schema.
    pub fn into_current(self) -> Result<T, StorageError> {
        if self.version > rakhwala_proto::SCHEMA_VERSION {
            return Err(StorageError::UnsupportedSchema {
                found: self.version,
                supported: rakhwala_proto::SCHEMA_VERSION,
            });
        }
        Ok(self.value)
    }
}

/// Device-local key-value store for session and access code.
///
/// Must be Clone (shared by the App and the session context), Send + Sync,
/// and synchronous. Clones access the same underlying state.
///
/// # Panics
///
/// Implementations may panic if internal synchronization primitives are
/// poisoned. Acceptable for test/simulation code.
pub trait LocalStore: Clone + Send + Sync + 'static {
    /// Load the persisted session. Defaults to signed out when absent.
    fn load_session(&self) -> Result<AuthSession, StorageError>;

    /// Overwrite the persisted session.
    fn store_session(&self, session: &AuthSession) -> Result<(), StorageError>;

    /// Load the device access code, if one was ever generated.
    fn load_access_code(&self) -> Result<Option<AccessCode>, StorageError>;

    /// Persist `code` unless a code already exists.
    ///
    /// # Invariants
    ///
    /// - Post: returns the code that is persisted after the call. First
    ///   writer wins; later candidates are discarded.
    fn store_access_code_if_absent(&self, code: AccessCode) -> Result<AccessCode, StorageError>;
}
