//! Observable state snapshots for invariant checking.
//!
//! Snapshots capture what a screen would show at a point in time.
//! Invariants operate on snapshots rather than live state so a check sees one
//! consistent frame, and so history-based checks can compare frames.

use rakhwala_app::{App, RouteStatus, SharingStatus};
use rakhwala_core::SosOutcome;
use rakhwala_proto::{AccessCode, ContactId, Coordinate};

/// Rendered frames of one run, oldest first.
#[derive(Debug, Clone, Default)]
pub struct SystemSnapshot {
    /// Every frame so far. The last one is the current state.
    pub frames: Vec<AppSnapshot>,
}

impl SystemSnapshot {
    /// Create an empty snapshot (nothing rendered).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a snapshot with a single frame.
    pub fn single(frame: AppSnapshot) -> Self {
        Self { frames: vec![frame] }
    }

    /// Create a snapshot from a frame history.
    pub fn from_frames(frames: Vec<AppSnapshot>) -> Self {
        Self { frames }
    }

    /// Append a frame.
    pub fn push(&mut self, frame: AppSnapshot) {
        self.frames.push(frame);
    }

    /// Most recent frame.
    pub fn current(&self) -> Option<&AppSnapshot> {
        self.frames.last()
    }
}

/// One frame of observable app state.
#[derive(Debug, Clone, PartialEq)]
pub struct AppSnapshot {
    /// Device access code.
    pub access_code: AccessCode,
    /// Whether a user is signed in.
    pub signed_in: bool,
    /// Location sharing status.
    pub sharing: SharingStatus,
    /// Code being followed.
    pub tracking: Option<AccessCode>,
    /// Map center.
    pub map_center: Option<Coordinate>,
    /// Map zoom.
    pub map_zoom: f32,
    /// Tracked marker.
    pub marker: Option<Coordinate>,
    /// Contact ids, in list order.
    pub contact_ids: Vec<ContactId>,
    /// Number of routes shown.
    pub route_count: usize,
    /// Route list status.
    pub route_status: RouteStatus,
    /// Whether an SOS attempt is running.
    pub sos_active: bool,
    /// Last finished SOS attempt.
    pub last_sos: Option<SosOutcome>,
    /// Whether the call monitor is registered.
    pub call_monitor_registered: bool,
    /// Status line.
    pub status_message: Option<String>,
}

impl AppSnapshot {
    /// Capture the observable state of `app`.
    pub fn from_app(app: &App) -> Self {
        let map = app.map();
        Self {
            access_code: app.access_code(),
            signed_in: app.is_signed_in(),
            sharing: app.sharing(),
            tracking: app.tracking(),
            map_center: map.center,
            map_zoom: map.zoom,
            marker: map.marker,
            contact_ids: app.contacts().iter().map(|c| c.id.clone()).collect(),
            route_count: app.routes().len(),
            route_status: app.route_status().clone(),
            sos_active: app.sos_active(),
            last_sos: app.last_sos().cloned(),
            call_monitor_registered: app.call_monitor_registered(),
            status_message: app.status_message().map(str::to_string),
        }
    }

    /// Code published under, if sharing.
    pub fn sharing_code(&self) -> Option<AccessCode> {
        match self.sharing {
            SharingStatus::Stopped => None,
            SharingStatus::Starting(code) | SharingStatus::Active(code) => Some(code),
        }
    }
}
