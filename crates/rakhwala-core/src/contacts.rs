//! Per-user emergency contacts in the remote store.
//!
//! Contacts live at `users/<user_id>/contacts/<contact_id>`. Ids are
//! store-generated push keys, so listing returns contacts in creation order.

use std::sync::Arc;

use rakhwala_proto::{Contact, ContactId, ContactRecord, StorePath, StoredContact, UserId};
use serde_json::Value;

use crate::{SafetyError, remote::RemoteStore};

/// Contact CRUD over a [`RemoteStore`].
#[derive(Clone)]
pub struct ContactStore {
    remote: Arc<dyn RemoteStore>,
}

impl ContactStore {
    /// Wrap a remote store.
    pub fn new(remote: Arc<dyn RemoteStore>) -> Self {
        Self { remote }
    }

    /// All contacts of `user`.
    ///
    /// Entries that fail to decode (wrong shape, blank field, newer schema)
    /// are skipped with a warning rather than failing the whole list.
    pub async fn list(&self, user: &UserId) -> Result<Vec<StoredContact>, SafetyError> {
        let path = StorePath::contacts(user)?;
        let Some(snapshot) = self.remote.get(&path).await? else {
            return Ok(Vec::new());
        };

        let Value::Object(entries) = snapshot else {
            tracing::warn!(%path, "contacts node is not an object");
            return Ok(Vec::new());
        };

        let mut contacts: Vec<StoredContact> = entries
            .into_iter()
            .filter_map(|(key, value)| match decode_contact(value) {
                Ok(contact) => Some(StoredContact { id: ContactId::new(key), contact }),
                Err(err) => {
                    tracing::warn!(%path, %key, error = %err, "skipping undecodable contact");
                    None
                },
            })
            .collect();
        contacts.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(contacts)
    }

    /// Store `contact` under a fresh key and return the refreshed list.
    pub async fn add(&self, user: &UserId, contact: &Contact) -> Result<Vec<StoredContact>, SafetyError> {
        contact.validate()?;
        let path = StorePath::contacts(user)?;
        let record = serde_json::to_value(ContactRecord::from(contact))
            .map_err(|e| SafetyError::Protocol(e.into()))?;

        let key = self.remote.push(&path, record).await?;
        tracing::debug!(%path, %key, "contact added");
        self.list(user).await
    }

    /// Delete every contact named `contact.name` and return the refreshed list.
    ///
    /// Matches on name only, so two contacts sharing a name are both removed.
    /// Use [`Self::remove_by_id`] to delete exactly one entry.
    pub async fn remove(&self, user: &UserId, contact: &Contact) -> Result<Vec<StoredContact>, SafetyError> {
        let path = StorePath::contacts(user)?;
        let matches = self
            .remote
            .query_equal(&path, "name", &Value::String(contact.name.clone()))
            .await?;

        for (key, _) in &matches {
            self.remote.remove(&path.child(key)?).await?;
        }
        tracing::debug!(%path, removed = matches.len(), "contacts removed by name");
        self.list(user).await
    }

    /// Delete the entry stored under `id` and return the refreshed list.
    pub async fn remove_by_id(&self, user: &UserId, id: &ContactId) -> Result<Vec<StoredContact>, SafetyError> {
        let path = StorePath::contact(user, id)?;
        self.remote.remove(&path).await?;
        tracing::debug!(%path, "contact removed");
        self.list(user).await
    }
}

fn decode_contact(value: Value) -> Result<Contact, rakhwala_proto::ProtocolError> {
    let record: ContactRecord = serde_json::from_value(value)?;
    record.into_contact()
}
