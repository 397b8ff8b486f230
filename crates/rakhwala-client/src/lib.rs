//! Network adapters for Rakhwala.
//!
//! The core crate only knows the [`RouteSource`](rakhwala_core::RouteSource)
//! and [`RemoteStore`](rakhwala_core::RemoteStore) traits. This crate binds
//! them to real services over HTTP:
//!
//! - [`HttpRouteSource`]: the safe-route API (`GET /v1/get-route`)
//! - [`FirebaseStore`]: a realtime database through its REST interface,
//!   with subscriptions implemented by polling
//! - [`SystemEnv`]: wall-clock time and OS randomness for binaries

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod error;
pub mod firebase;
pub mod route_client;
mod system_env;

pub use error::ClientError;
pub use firebase::{FirebaseConfig, FirebaseStore};
pub use route_client::{DEFAULT_BASE_URL, HttpRouteSource, RouteClientConfig};
pub use system_env::SystemEnv;
