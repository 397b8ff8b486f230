//! Six digit access codes identifying a location-sharing channel.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// Smallest valid access code.
pub const ACCESS_CODE_MIN: u32 = 100_000;

/// Largest valid access code.
pub const ACCESS_CODE_MAX: u32 = 999_999;

/// Number of distinct access codes.
pub const ACCESS_CODE_SPAN: u32 = ACCESS_CODE_MAX - ACCESS_CODE_MIN + 1;

/// Per-device code that names a live location channel.
///
/// Always a six digit decimal number in `[100000, 999999]`. Codes are not
/// globally unique: two devices may draw the same value, in which case their
/// publishes overwrite each other (last write wins).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccessCode(u32);

impl AccessCode {
    /// Create a code from its numeric value.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidAccessCode`] if `value` is outside
    /// `[100000, 999999]`.
    pub fn new(value: u32) -> Result<Self, ProtocolError> {
        if (ACCESS_CODE_MIN..=ACCESS_CODE_MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ProtocolError::InvalidAccessCode(value.to_string()))
        }
    }

    /// Map an offset in `[0, ACCESS_CODE_SPAN)` onto the code range.
    ///
    /// Offsets past the span wrap, so the result is always valid. Callers
    /// wanting a uniform code must draw the offset uniformly.
    pub fn from_offset(offset: u32) -> Self {
        Self(ACCESS_CODE_MIN + offset % ACCESS_CODE_SPAN)
    }

    /// Numeric value of the code.
    pub fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for AccessCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AccessCode {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.len() != 6 || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ProtocolError::InvalidAccessCode(s.to_string()));
        }

        let value =
            trimmed.parse::<u32>().map_err(|_| ProtocolError::InvalidAccessCode(s.to_string()))?;
        Self::new(value)
    }
}

impl TryFrom<String> for AccessCode {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AccessCode> for String {
    fn from(code: AccessCode) -> Self {
        code.to_string()
    }
}
