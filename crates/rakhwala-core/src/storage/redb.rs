//! Redb-backed durable local store.
//!
//! Uses Redb's ACID transactions, so a crash mid-write leaves either the old
//! or the new value.

use std::{path::Path, sync::Arc};

use rakhwala_proto::{AccessCode, AuthSession};
use redb::{Database, ReadableTable, TableDefinition};
use serde::{Serialize, de::DeserializeOwned};

use super::{LocalStore, StorageError, Versioned};

/// Table: prefs
/// Key: preference name
/// Value: CBOR-encoded `Versioned<T>`
const PREFS: TableDefinition<&str, &[u8]> = TableDefinition::new("prefs");

const SESSION_KEY: &str = "session";
const ACCESS_CODE_KEY: &str = "access_code";

/// Durable local store backed by Redb.
///
/// Thread-safe through Redb's internal locking. Clone is cheap (Arc).
#[derive(Clone)]
pub struct RedbLocalStore {
    db: Arc<Database>,
}

impl RedbLocalStore {
    /// Open or create a database at `path`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the database cannot be opened or created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let db = Database::create(path.as_ref()).map_err(|e| StorageError::Io(e.to_string()))?;

        let txn = db.begin_write().map_err(|e| StorageError::Io(e.to_string()))?;
        {
            let _ = txn.open_table(PREFS).map_err(|e| StorageError::Io(e.to_string()))?;
        }
        txn.commit().map_err(|e| StorageError::Io(e.to_string()))?;

        Ok(Self { db: Arc::new(db) })
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        let txn = self.db.begin_read().map_err(|e| StorageError::Io(e.to_string()))?;
        let table = txn.open_table(PREFS).map_err(|e| StorageError::Io(e.to_string()))?;

        let Some(bytes) = table.get(key).map_err(|e| StorageError::Io(e.to_string()))? else {
            return Ok(None);
        };

        decode(bytes.value()).map(Some)
    }

    fn write<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let bytes = encode(value)?;

        let txn = self.db.begin_write().map_err(|e| StorageError::Io(e.to_string()))?;
        {
            let mut table = txn.open_table(PREFS).map_err(|e| StorageError::Io(e.to_string()))?;
            table.insert(key, bytes.as_slice()).map_err(|e| StorageError::Io(e.to_string()))?;
        }
        txn.commit().map_err(|e| StorageError::Io(e.to_string()))?;

        Ok(())
    }
}

impl LocalStore for RedbLocalStore {
    fn load_session(&self) -> Result<AuthSession, StorageError> {
        Ok(self.read(SESSION_KEY)?.unwrap_or_default())
    }

    fn store_session(&self, session: &AuthSession) -> Result<(), StorageError> {
        self.write(SESSION_KEY, session)
    }

    fn load_access_code(&self) -> Result<Option<AccessCode>, StorageError> {
        self.read(ACCESS_CODE_KEY)
    }

    fn store_access_code_if_absent(&self, code: AccessCode) -> Result<AccessCode, StorageError> {
        // Check and insert under one write transaction so two racing
        // generators agree on the winner.
        let txn = self.db.begin_write().map_err(|e| StorageError::Io(e.to_string()))?;
        let winner = {
            let mut table = txn.open_table(PREFS).map_err(|e| StorageError::Io(e.to_string()))?;

            let existing = table
                .get(ACCESS_CODE_KEY)
                .map_err(|e| StorageError::Io(e.to_string()))?
                .map(|bytes| decode::<AccessCode>(bytes.value()))
                .transpose()?;

            match existing {
                Some(existing) => existing,
                None => {
                    let bytes = encode(&code)?;
                    table
                        .insert(ACCESS_CODE_KEY, bytes.as_slice())
                        .map_err(|e| StorageError::Io(e.to_string()))?;
                    code
                },
            }
        };
        txn.commit().map_err(|e| StorageError::Io(e.to_string()))?;

        Ok(winner)
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, StorageError> {
    let mut bytes = Vec::new();
    ciborium::into_writer(&Versioned::current(value), &mut bytes)
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
    Ok(bytes)
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StorageError> {
    let versioned: Versioned<T> =
        ciborium::from_reader(bytes).map_err(|e| StorageError::Serialization(e.to_string()))?;
    versioned.into_current()
}
