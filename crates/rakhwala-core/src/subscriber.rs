//! Location subscriber: turns store snapshots into map updates.

use rakhwala_proto::{Coordinate, LocationRecord, LocationSample};

use crate::remote::{RemoteError, Snapshot};

/// Default map zoom when re-centering on a tracked position.
pub const TRACKING_ZOOM: f32 = 15.0;

/// One event observed on a tracked access code.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackUpdate {
    /// A new position was published.
    Position(LocationSample),
    /// Nothing is stored under the code.
    NoData,
    /// The store reported an error, or the record was malformed. The
    /// subscription stays open.
    Error(String),
}

/// Classify one subscription item.
pub fn decode_update(item: Result<Snapshot, RemoteError>) -> TrackUpdate {
    match item {
        Ok(None) => TrackUpdate::NoData,
        Ok(Some(value)) => match serde_json::from_value::<LocationRecord>(value) {
            Ok(record) => match record.into_sample() {
                Ok(sample) => TrackUpdate::Position(sample),
                Err(err) => TrackUpdate::Error(err.to_string()),
            },
            Err(err) => TrackUpdate::Error(format!("invalid location record: {err}")),
        },
        Err(err) => TrackUpdate::Error(err.to_string()),
    }
}

/// Map viewport plus the single tracked marker.
#[derive(Debug, Clone, PartialEq)]
pub struct MapView {
    /// Viewport center. `None` before the first position.
    pub center: Option<Coordinate>,
    /// Viewport zoom level.
    pub zoom: f32,
    /// Tracked marker. At most one exists.
    pub marker: Option<Coordinate>,
}

impl Default for MapView {
    fn default() -> Self {
        Self { center: None, zoom: TRACKING_ZOOM, marker: None }
    }
}

impl MapView {
    /// Apply a tracking update. Returns true if the view changed.
    ///
    /// A position re-centers the viewport and moves the marker; the previous
    /// marker is replaced, never duplicated. `NoData` and errors leave the
    /// view untouched so the last known position stays on screen.
    pub fn apply(&mut self, update: &TrackUpdate) -> bool {
        let TrackUpdate::Position(sample) = update else {
            return false;
        };

        let point = Coordinate::from(*sample);
        self.center = Some(point);
        self.zoom = TRACKING_ZOOM;
        self.marker = Some(point);
        true
    }
}
