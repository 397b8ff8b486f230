#![allow(clippy::disallowed_types, reason = "Synchronous in-memory operations only")]

use std::sync::{Arc, Mutex};

use rakhwala_proto::{AccessCode, AuthSession};

use super::{LocalStore, StorageError};

/// In-memory local store for tests and simulation.
///
/// Uses `lock().expect()` which panics if the mutex is poisoned; acceptable
/// for test code.
#[derive(Clone, Default)]
pub struct MemoryLocalStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    session: Option<AuthSession>,
    access_code: Option<AccessCode>,
}

impl MemoryLocalStore {
    /// Create an empty store: signed out, no access code.
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStore for MemoryLocalStore {
    #[allow(clippy::expect_used)]
    fn load_session(&self) -> Result<AuthSession, StorageError> {
        Ok(self.inner.lock().expect("Mutex poisoned").session.clone().unwrap_or_default())
    }

    #[allow(clippy::expect_used)]
    fn store_session(&self, session: &AuthSession) -> Result<(), StorageError> {
        self.inner.lock().expect("Mutex poisoned").session = Some(session.clone());
        Ok(())
    }

    #[allow(clippy::expect_used)]
    fn load_access_code(&self) -> Result<Option<AccessCode>, StorageError> {
        Ok(self.inner.lock().expect("Mutex poisoned").access_code)
    }

    #[allow(clippy::expect_used)]
    fn store_access_code_if_absent(&self, code: AccessCode) -> Result<AccessCode, StorageError> {
        let mut inner = self.inner.lock().expect("Mutex poisoned");
        Ok(*inner.access_code.get_or_insert(code))
    }
}
