//! Sign-in state and the identifiers derived from it.

use rakhwala_proto::{AccessCode, AuthSession, UserId};

use crate::{
    SafetyError, access_code::AccessCodeStore, env::Environment, storage::LocalStore,
};

/// Signed-in identity plus the device access code.
///
/// Loaded once at startup and passed to the components that need it, so no
/// component reads global state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    session: AuthSession,
    access_code: AccessCode,
}

impl SessionContext {
    /// Load the persisted session and ensure an access code exists.
    pub fn load<S: LocalStore, E: Environment>(storage: &S, env: &E) -> Result<Self, SafetyError> {
        let session = storage.load_session()?;
        let access_code = AccessCodeStore::new(storage.clone()).get_or_create(env)?;
        tracing::debug!(signed_in = session.is_signed_in, %access_code, "session loaded");
        Ok(Self { session, access_code })
    }

    /// Build a context directly (tests, simulation).
    pub fn new(session: AuthSession, access_code: AccessCode) -> Self {
        Self { session, access_code }
    }

    /// Record a completed sign-in and persist it.
    pub fn sign_in<S: LocalStore>(&mut self, storage: &S, user: UserId) -> Result<(), SafetyError> {
        let session = AuthSession::signed_in(user);
        storage.store_session(&session)?;
        tracing::info!(user = %session.user_id.as_ref().map_or("", UserId::as_str), "signed in");
        self.session = session;
        Ok(())
    }

    /// Clear the session and persist it. The access code is kept.
    pub fn sign_out<S: LocalStore>(&mut self, storage: &S) -> Result<(), SafetyError> {
        let session = AuthSession::default();
        storage.store_session(&session)?;
        tracing::info!("signed out");
        self.session = session;
        Ok(())
    }

    /// Whether a user is signed in.
    pub fn is_signed_in(&self) -> bool {
        self.session.active_user().is_some()
    }

    /// Signed-in user.
    ///
    /// # Errors
    ///
    /// Returns [`SafetyError::AuthRequired`] when signed out.
    pub fn user_id(&self) -> Result<&UserId, SafetyError> {
        self.session.active_user().ok_or(SafetyError::AuthRequired)
    }

    /// Device access code.
    pub fn access_code(&self) -> AccessCode {
        self.access_code
    }
}
