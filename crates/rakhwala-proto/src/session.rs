//! Authenticated session identity.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier assigned by the auth provider to a signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Wrap a provider user id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Locally persisted sign-in state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    /// Whether sign-in completed on this device.
    pub is_signed_in: bool,
    /// Provider user id. `None` until sign-in completes.
    pub user_id: Option<UserId>,
}

impl AuthSession {
    /// Session for a user that just signed in.
    pub fn signed_in(user_id: UserId) -> Self {
        Self { is_signed_in: true, user_id: Some(user_id) }
    }

    /// Signed-in user id. `None` if signed out.
    pub fn active_user(&self) -> Option<&UserId> {
        if self.is_signed_in { self.user_id.as_ref() } else { None }
    }
}
