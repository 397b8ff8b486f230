//! Platform trait for device capabilities.
//!
//! [`Platform`] decouples the runtime from a specific device API. A phone
//! binding implements it over the OS telephony, location, speech and
//! navigation services; the simulation harness implements it with scripted
//! responses. The generic [`crate::Runtime`] handles all orchestration.

use std::future::Future;

use rakhwala_core::{Capability, NavigationIntent};
use rakhwala_proto::LocationSample;
use thiserror::Error;

use crate::{App, AppEvent};

/// Opaque failure reported by a platform service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct PlatformError(pub String);

impl PlatformError {
    /// Wrap a platform message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Device services used by the runtime.
///
/// Must be Clone: background tasks (sharing, SOS steps, route origin) each
/// hold a clone. Clones share the underlying device.
pub trait Platform: Clone + Send + Sync + 'static {
    /// Wait for the next user command or call-state change.
    ///
    /// Returns `None` when the UI has closed. Must be cancel-safe: the
    /// runtime races it against background results.
    fn poll_event(&mut self) -> impl Future<Output = Option<AppEvent>> + Send;

    /// Whether `capability` is currently granted.
    fn has_permission(&self, capability: Capability) -> bool;

    /// Show the system prompt for `capability` and wait for the answer.
    fn request_permission(&self, capability: Capability) -> impl Future<Output = bool> + Send;

    /// Last known location. `None` when the device has no cached fix.
    fn last_known_location(&self) -> impl Future<Output = Option<LocationSample>> + Send;

    /// Acquire a fresh high-accuracy fix.
    fn current_location(&self) -> impl Future<Output = Result<LocationSample, PlatformError>> + Send;

    /// Send one plain-text message. No delivery confirmation.
    fn send_sms(
        &self,
        number: &str,
        message: &str,
    ) -> impl Future<Output = Result<(), PlatformError>> + Send;

    /// Hand `number` to the dialer.
    fn place_call(&self, number: &str) -> impl Future<Output = Result<(), PlatformError>> + Send;

    /// Switch call audio to the loudspeaker.
    fn route_audio_to_speaker(&self) -> Result<(), PlatformError>;

    /// Speak `text` with on-device speech synthesis.
    fn speak(&self, text: &str) -> Result<(), PlatformError>;

    /// Open external turn-by-turn navigation.
    fn open_navigation(&self, intent: &NavigationIntent) -> Result<(), PlatformError>;

    /// Render the application state.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails; the runtime stops.
    fn render(&mut self, app: &App) -> Result<(), PlatformError>;
}
