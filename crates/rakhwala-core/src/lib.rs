//! Safety workflow logic for Rakhwala.
//!
//! Every component here is either a pure state machine (`LocationPublisher`,
//! `SosFlow`, `CallMonitor`, `MapView`) or a thin async wrapper over a store
//! trait (`ContactStore`, `AccessCodeStore`). Nothing touches the network,
//! the clock or the device directly: time and randomness come from
//! [`Environment`], persistence from [`LocalStore`] and [`RemoteStore`].
//!
//! # Components
//!
//! - [`access_code`]: per-device six digit code, generated once
//! - [`session`]: explicit sign-in context replacing ambient globals
//! - [`contacts`]: emergency contact CRUD
//! - [`publisher`]: periodic location publishing under an access code
//! - [`subscriber`]: decoding tracked locations into map updates
//! - [`sos`]: the SOS pipeline and SMS fan-out
//! - [`call_monitor`]: speaker + speech on call pickup
//! - [`route`]: route source trait and navigation hand-off

#![forbid(unsafe_code)]

pub mod access_code;
pub mod call_monitor;
mod capability;
pub mod contacts;
pub mod env;
pub mod error;
pub mod publisher;
pub mod remote;
pub mod route;
pub mod session;
pub mod sos;
pub mod storage;
pub mod subscriber;

pub use access_code::AccessCodeStore;
pub use call_monitor::{CallAction, CallMonitor, CallState};
pub use capability::Capability;
pub use contacts::ContactStore;
pub use env::Environment;
pub use error::{RouteError, SafetyError};
pub use publisher::{LocationPublisher, PublisherAction, PublisherConfig, PublisherState};
pub use remote::{ChaoticRemoteStore, MemoryRemoteStore, RemoteError, RemoteStore, Snapshot, Subscription};
pub use route::{NavigationIntent, RouteSource, navigation_intent};
pub use session::SessionContext;
pub use sos::{
    CallOrder, SmsBatchReport, SmsFailure, SosAction, SosConfig, SosFlow, SosInput, SosOutcome, SosStage,
    dispatch_alerts, sos_message,
};
pub use storage::{LocalStore, MemoryLocalStore, RedbLocalStore, StorageError};
pub use subscriber::{MapView, TrackUpdate, decode_update};
