//! Application layer for Rakhwala
//!
//! Pure view-model state machine and a generic runtime that executes its
//! actions against device services, enabling deterministic simulation
//! testing with the same code that runs on a device.
//!
//! # Components
//!
//! - [`App`]: view-model state machine (commands, SOS, contacts, routes, map)
//! - [`Platform`]: trait for device services
//! - [`Runtime`]: generic orchestration loop using Platform
//! - [`SharingHandle`] / [`TrackingHandle`]: background publisher and
//!   subscriber tasks

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod action;
mod app;
mod event;
mod input;
mod platform;
mod runtime;
mod sharing;
mod state;
mod tracking;

pub use action::AppAction;
pub use app::{App, status_message};
pub use event::AppEvent;
pub use input::UserCommand;
pub use platform::{Platform, PlatformError};
pub use runtime::{Runtime, RuntimeConfig};
pub use sharing::SharingHandle;
pub use state::{RouteStatus, SharingStatus};
pub use tracking::TrackingHandle;
