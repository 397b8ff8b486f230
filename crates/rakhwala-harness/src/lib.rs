//! Deterministic simulation harness for Rakhwala.
//!
//! Implementations of the Environment and Platform traits that let the
//! production [`rakhwala_app::Runtime`] run under tokio's paused clock with
//! a seeded RNG, a scripted device and in-memory stores.
//!
//! # Invariant Testing
//!
//! The `invariants` module provides behavioral testing through invariant
//! checks. Invariants verify WHAT must be true across all execution paths, not
//! specific scenarios. Use [`InvariantRegistry::standard()`] for the common
//! App invariants, and [`SimPlatform::with_invariants`] to check them on
//! every rendered frame.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod invariants;
pub mod routes;
pub mod sim_env;
pub mod sim_platform;

pub use invariants::{AppSnapshot, Invariant, InvariantRegistry, InvariantResult, SystemSnapshot, Violation};
pub use routes::StaticRouteSource;
pub use sim_env::SimEnv;
pub use sim_platform::{Effect, SimPlatform};
