//! Observable application state.
//!
//! These types are the view model handed to [`crate::Platform::render`].

use rakhwala_core::RouteError;
use rakhwala_proto::AccessCode;

/// Live location sharing status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SharingStatus {
    /// Not sharing.
    #[default]
    Stopped,
    /// Publisher started, waiting for permission.
    Starting(AccessCode),
    /// Publishing under the code.
    Active(AccessCode),
}

/// Route list status.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RouteStatus {
    /// No query made.
    #[default]
    Idle,
    /// Waiting for the origin fix or the route API.
    Loading,
    /// Routes shown.
    Loaded,
    /// Last query failed.
    Failed(RouteError),
}
