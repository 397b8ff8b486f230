//! Application input events.
//!
//! [`AppEvent`] is every input that drives the [`crate::App`] state
//! machine. Events come from two sources:
//! - user commands and call-state changes reported by the platform
//! - results of background work started by the runtime

use rakhwala_core::{CallState, RouteError, SafetyError, SosInput, TrackUpdate};
use rakhwala_proto::{AccessCode, Coordinate, LocationSample, Route, StoredContact};

use crate::UserCommand;

/// Events processed by the App state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// User intent.
    Command(UserCommand),

    /// Result for the running SOS attempt.
    Sos(SosInput),

    /// Contact list fetched or refreshed after a change.
    ContactsLoaded(Result<Vec<StoredContact>, SafetyError>),

    /// Location sharing reached the publishing state.
    SharingStarted {
        /// Code being published.
        code: AccessCode,
    },

    /// Location sharing ended.
    SharingStopped {
        /// Code that was published.
        code: AccessCode,
    },

    /// Location sharing could not start.
    SharingFailed {
        /// Code that was requested.
        code: AccessCode,
        /// Why.
        error: SafetyError,
    },

    /// Update on a tracked access code.
    Tracked {
        /// Code being followed.
        code: AccessCode,
        /// What the subscription reported.
        update: TrackUpdate,
    },

    /// The subscription for a tracked code closed.
    TrackingEnded {
        /// Code that was followed.
        code: AccessCode,
    },

    /// Origin for a pending route query resolved.
    RouteOrigin {
        /// Trip destination.
        destination: Coordinate,
        /// Last known location. `None` without a fix.
        origin: Option<LocationSample>,
    },

    /// Route query finished.
    RoutesLoaded(Result<Vec<Route>, RouteError>),

    /// Device call state changed.
    CallStateChanged(CallState),

    /// Sign-in state changed and was persisted.
    SessionChanged {
        /// Whether a user is now signed in.
        signed_in: bool,
    },

    /// A fire-and-forget platform request failed.
    Failure(SafetyError),
}
