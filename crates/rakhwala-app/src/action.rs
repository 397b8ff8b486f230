//! Application side-effects and intents.
//!
//! [`AppAction`]s are instructions produced by the [`crate::App`] state
//! machine for the runtime to execute.

use rakhwala_core::{CallAction, NavigationIntent, SosAction};
use rakhwala_proto::{AccessCode, Contact, ContactId, Coordinate, RouteQuery, UserId};

/// Actions produced by the App state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum AppAction {
    /// Render the UI.
    Render,

    /// Quit the application.
    Quit,

    /// Execute an SOS step and feed its result back as [`crate::AppEvent::Sos`].
    Sos(SosAction),

    /// Fetch the signed-in user's contacts.
    LoadContacts,

    /// Store a new contact.
    AddContact(Contact),

    /// Delete one contact by its stable id.
    DeleteContact(ContactId),

    /// Start the background location publisher.
    StartSharing {
        /// Code to publish under.
        code: AccessCode,
    },

    /// Stop the background location publisher.
    StopSharing,

    /// Subscribe to a shared location.
    StartTracking {
        /// Code to follow.
        code: AccessCode,
    },

    /// Drop the current subscription.
    StopTracking,

    /// Read the last known location as a route origin.
    ResolveRouteOrigin {
        /// Trip destination.
        destination: Coordinate,
    },

    /// Query the route API off the dispatch loop.
    FetchRoutes(RouteQuery),

    /// Hand a route to external navigation.
    OpenNavigation(NavigationIntent),

    /// Execute a call-monitor effect.
    Call(CallAction),

    /// Persist a completed sign-in.
    SignIn(UserId),

    /// Persist a sign-out.
    SignOut,
}
