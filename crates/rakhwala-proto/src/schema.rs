//! Schema version tags for persisted records.

use crate::ProtocolError;

/// Current schema version written on every record.
pub const SCHEMA_VERSION: u32 = 1;

/// Version assumed for records that predate version tags.
pub(crate) fn legacy_version() -> u32 {
    1
}

/// Reject records written by a newer schema.
///
/// # Errors
///
/// Returns [`ProtocolError::UnsupportedSchema`] if `found` is newer than
/// [`SCHEMA_VERSION`].
pub fn check_version(found: u32) -> Result<(), ProtocolError> {
    if found > SCHEMA_VERSION {
        return Err(ProtocolError::UnsupportedSchema { found, supported: SCHEMA_VERSION });
    }
    Ok(())
}
