//! Location publisher state machine.
//!
//! Sans-IO: the caller feeds permission results, timer ticks and location
//! samples, and executes the returned [`PublisherAction`]s. The driver that
//! owns the timer and the store lives in the app layer.
//!
//! ```text
//! Idle ──start(granted)──────────────────────────► Publishing
//!   │                                                 ▲   │
//!   └──start(!granted)──► RequestingPermission ──ok───┘   │
//!                               │ denied                  │ stop
//!                               ▼                         ▼
//!                              Idle ◄──────────────────── Idle
//! ```

use std::time::Duration;

use rakhwala_proto::{AccessCode, LocationSample, StorePath};

/// Publisher timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublisherConfig {
    /// Target interval between fix requests.
    pub interval: Duration,
    /// Samples closer together than this are dropped.
    pub fastest_interval: Duration,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            fastest_interval: Duration::from_secs(5),
        }
    }
}

/// Publisher lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublisherState {
    /// Not sharing.
    Idle,
    /// Waiting for the platform location prompt.
    RequestingPermission,
    /// Periodically acquiring and publishing fixes.
    Publishing,
}

/// Side effects requested by the publisher.
#[derive(Debug, Clone, PartialEq)]
pub enum PublisherAction {
    /// Ask the user for the location capability.
    RequestPermission,
    /// Acquire a high-accuracy fix and feed it back via `on_sample`.
    RequestFix,
    /// Overwrite the value at `path` with `sample`.
    Publish {
        /// `locations/<code>`.
        path: StorePath,
        /// Sample to write.
        sample: LocationSample,
    },
}

/// Location publisher for one access code.
///
/// Generic over the instant type so simulation can drive it with a virtual
/// clock.
#[derive(Debug, Clone)]
pub struct LocationPublisher<I> {
    config: PublisherConfig,
    state: PublisherState,
    code: Option<AccessCode>,
    last_fix_request: Option<I>,
    last_publish: Option<I>,
}

impl<I> LocationPublisher<I>
where
    I: Copy + Ord + std::ops::Sub<Output = Duration>,
{
    /// Create an idle publisher.
    pub fn new(config: PublisherConfig) -> Self {
        Self { config, state: PublisherState::Idle, code: None, last_fix_request: None, last_publish: None }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PublisherState {
        self.state
    }

    /// Access code being published, if any.
    pub fn code(&self) -> Option<AccessCode> {
        self.code
    }

    /// Timing configuration.
    pub fn config(&self) -> &PublisherConfig {
        &self.config
    }

    /// Begin sharing under `code`.
    ///
    /// `granted` is the current state of the location capability. Without
    /// it the publisher waits in `RequestingPermission`; only one prompt is
    /// ever in flight. Calling `start` while already active is ignored.
    pub fn start(&mut self, code: AccessCode, granted: bool, now: I) -> Vec<PublisherAction> {
        if self.state != PublisherState::Idle {
            tracing::debug!(%code, state = ?self.state, "publisher already active");
            return Vec::new();
        }

        self.code = Some(code);
        if granted {
            self.begin_publishing(now)
        } else {
            self.state = PublisherState::RequestingPermission;
            vec![PublisherAction::RequestPermission]
        }
    }

    /// Platform resolved the permission prompt.
    ///
    /// A denial returns the publisher to `Idle`. Results arriving in any
    /// other state are stale and ignored.
    pub fn permission_resolved(&mut self, granted: bool, now: I) -> Vec<PublisherAction> {
        if self.state != PublisherState::RequestingPermission {
            return Vec::new();
        }

        if granted {
            self.begin_publishing(now)
        } else {
            tracing::info!("location permission denied, sharing not started");
            self.reset();
            Vec::new()
        }
    }

    /// Timer tick. Requests a fix once per `interval`.
    pub fn tick(&mut self, now: I) -> Vec<PublisherAction> {
        if self.state != PublisherState::Publishing {
            return Vec::new();
        }

        let due = self.last_fix_request.is_none_or(|last| now - last >= self.config.interval);
        if !due {
            return Vec::new();
        }

        self.last_fix_request = Some(now);
        vec![PublisherAction::RequestFix]
    }

    /// A location sample arrived.
    ///
    /// Emits a publish unless the previous publish was less than
    /// `fastest_interval` ago. Samples after `stop` are discarded, but a
    /// publish already handed out is not retracted.
    pub fn on_sample(&mut self, sample: LocationSample, now: I) -> Vec<PublisherAction> {
        if self.state != PublisherState::Publishing {
            return Vec::new();
        }
        let Some(code) = self.code else {
            return Vec::new();
        };

        let too_soon = self.last_publish.is_some_and(|last| now - last < self.config.fastest_interval);
        if too_soon {
            tracing::trace!("dropping sample inside fastest interval");
            return Vec::new();
        }

        self.last_publish = Some(now);
        vec![PublisherAction::Publish { path: StorePath::location(code), sample }]
    }

    /// Stop sharing. Idempotent; returns whether the publisher was active.
    pub fn stop(&mut self) -> bool {
        let was_active = self.state != PublisherState::Idle;
        if was_active {
            tracing::info!(code = ?self.code, "location sharing stopped");
        }
        self.reset();
        was_active
    }

    fn begin_publishing(&mut self, now: I) -> Vec<PublisherAction> {
        self.state = PublisherState::Publishing;
        self.last_fix_request = Some(now);
        tracing::info!(code = ?self.code, "location sharing started");
        vec![PublisherAction::RequestFix]
    }

    fn reset(&mut self) {
        self.state = PublisherState::Idle;
        self.code = None;
        self.last_fix_request = None;
        self.last_publish = None;
    }
}
