//! Platform-agnostic user commands.

use rakhwala_proto::{ContactId, Coordinate, UserId};

/// A user intent delivered by the platform's UI layer.
///
/// Decouples application logic from any widget toolkit so the same runtime
/// runs on a device and in simulation.
#[derive(Debug, Clone, PartialEq)]
pub enum UserCommand {
    /// SOS button pressed.
    TriggerSos,
    /// Start sharing live location under this device's access code.
    StartSharing,
    /// Stop sharing live location.
    StopSharing,
    /// Follow the location shared under a typed access code.
    Track(String),
    /// Stop following a shared location.
    StopTracking,
    /// Contact picked from the device address book.
    AddContact {
        /// Display name.
        name: String,
        /// Phone number.
        phone_number: String,
    },
    /// Contact long-pressed for deletion.
    DeleteContact(ContactId),
    /// Reload the contact list.
    RefreshContacts,
    /// Find safe routes from the current location to `destination`.
    FindRoutes {
        /// Trip destination.
        destination: Coordinate,
    },
    /// Route at this list position tapped.
    SelectRoute(usize),
    /// Auth provider finished sign-in.
    SignIn(UserId),
    /// User signed out.
    SignOut,
    /// Hosting screen closed. Sharing keeps running.
    CloseScreen,
    /// Exit the application.
    Quit,
}
