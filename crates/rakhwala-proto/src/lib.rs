//! Data model and wire formats for Rakhwala.
//!
//! Everything that crosses a boundary lives here: the records written to the
//! remote key-value store, the route API response, and the identifiers that
//! link a location publisher to its subscribers.
//!
//! # Store layout
//!
//! ```text
//! locations/<access_code>                 -> LocationRecord
//! users/<user_id>/contacts/<contact_id>   -> ContactRecord
//! ```
//!
//! Every stored record carries a `schemaVersion` tag. Records written before
//! tags existed decode as version 1; records from a newer schema are rejected
//! rather than silently misread.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod access_code;
pub mod contact;
pub mod error;
pub mod location;
pub mod path;
pub mod route;
pub mod schema;
pub mod session;

pub use access_code::AccessCode;
pub use contact::{Contact, ContactId, ContactRecord, StoredContact};
pub use error::ProtocolError;
pub use location::{LocationRecord, LocationSample};
pub use path::StorePath;
pub use route::{
    BadgeColor, Coordinate, Direction, Route, RouteQuery, RouteResponse, SafetyLabel, Summary,
};
pub use schema::SCHEMA_VERSION;
pub use session::{AuthSession, UserId};
