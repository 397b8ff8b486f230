//! Per-device access code: generated once, then stable.

use rakhwala_proto::{AccessCode, access_code::ACCESS_CODE_SPAN};

use crate::{
    env::Environment,
    storage::{LocalStore, StorageError},
};

/// Owns the device's access code.
#[derive(Clone)]
pub struct AccessCodeStore<S: LocalStore> {
    storage: S,
}

impl<S: LocalStore> AccessCodeStore<S> {
    /// Wrap a local store.
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Return the persisted code, generating and persisting one on first use.
    ///
    /// # Invariants
    ///
    /// - Post: every later call on this device returns the same code
    /// - Post: the code lies in `[100000, 999999]`
    ///
    /// Concurrent first calls both draw a candidate but only the first write
    /// persists; both callers get the persisted value.
    pub fn get_or_create<E: Environment>(&self, env: &E) -> Result<AccessCode, StorageError> {
        if let Some(code) = self.storage.load_access_code()? {
            return Ok(code);
        }

        let candidate = AccessCode::from_offset(env.random_below(u64::from(ACCESS_CODE_SPAN)) as u32);
        let code = self.storage.store_access_code_if_absent(candidate)?;
        tracing::info!(%code, "generated access code");
        Ok(code)
    }

    /// Persisted code without generating one.
    pub fn current(&self) -> Result<Option<AccessCode>, StorageError> {
        self.storage.load_access_code()
    }
}
