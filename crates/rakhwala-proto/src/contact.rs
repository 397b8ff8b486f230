//! Emergency contacts.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    ProtocolError,
    schema::{SCHEMA_VERSION, check_version, legacy_version},
};

/// An emergency contact: display name and phone number.
///
/// Both fields are non-empty. Construct through [`Contact::new`] to enforce
/// this; values decoded from the store are checked by
/// [`ContactRecord::into_contact`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    /// Display name as picked from the device address book.
    pub name: String,
    /// Phone number used for SOS text messages.
    pub phone_number: String,
}

impl Contact {
    /// Create a validated contact. Surrounding whitespace is trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::EmptyField`] if either field is blank.
    pub fn new(name: impl Into<String>, phone_number: impl Into<String>) -> Result<Self, ProtocolError> {
        let contact = Self {
            name: name.into().trim().to_string(),
            phone_number: phone_number.into().trim().to_string(),
        };
        contact.validate()?;
        Ok(contact)
    }

    /// Check that both fields are non-empty.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::EmptyField`] naming the first blank field.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if self.name.trim().is_empty() {
            return Err(ProtocolError::EmptyField("name"));
        }
        if self.phone_number.trim().is_empty() {
            return Err(ProtocolError::EmptyField("phoneNumber"));
        }
        Ok(())
    }
}

/// Key of a contact entry under `users/<user_id>/contacts`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContactId(String);

impl ContactId {
    /// Wrap a store-generated key.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A contact together with the key it is stored under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredContact {
    /// Store key.
    pub id: ContactId,
    /// Contact data.
    pub contact: Contact,
}

/// On-store representation of a contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactRecord {
    /// Display name.
    pub name: String,
    /// Phone number.
    pub phone_number: String,
    /// Schema version the record was written with.
    #[serde(default = "legacy_version")]
    pub schema_version: u32,
}

impl ContactRecord {
    /// Validate the record and extract the contact.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::UnsupportedSchema`] for records from a newer schema
    /// - [`ProtocolError::EmptyField`] if a field is blank
    pub fn into_contact(self) -> Result<Contact, ProtocolError> {
        check_version(self.schema_version)?;
        let contact = Contact { name: self.name, phone_number: self.phone_number };
        contact.validate()?;
        Ok(contact)
    }
}

impl From<&Contact> for ContactRecord {
    fn from(contact: &Contact) -> Self {
        Self {
            name: contact.name.clone(),
            phone_number: contact.phone_number.clone(),
            schema_version: SCHEMA_VERSION,
        }
    }
}
