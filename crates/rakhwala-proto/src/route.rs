//! Route API request and response types.
//!
//! The route API answers `GET /v1/get-route` with a ranked list of routes,
//! each annotated with a safety label and the number of police stations and
//! hospitals found near it. Field names follow the API's JSON exactly.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::{LocationSample, ProtocolError};

/// A point on a route.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl From<LocationSample> for Coordinate {
    fn from(sample: LocationSample) -> Self {
        Self { latitude: sample.latitude, longitude: sample.longitude }
    }
}

/// Per-leg travel summary as reported by the routing provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// Leg length in meters.
    pub length_in_meters: u64,
    /// Estimated travel time in seconds.
    pub travel_time_in_seconds: u64,
    /// Departure timestamp (ISO 8601).
    #[serde(default)]
    pub departure_time: String,
    /// Arrival timestamp (ISO 8601).
    #[serde(default)]
    pub arrival_time: String,
}

/// One leg of a route with its polyline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Direction {
    /// Leg summary.
    pub summary: Summary,
    /// Ordered polyline points.
    #[serde(default)]
    pub points: Vec<Coordinate>,
}

/// Safety classification attached to a route.
///
/// The API emits `"Safe"` and `"Not Safe"`; anything else is carried through
/// untouched and rendered with the neutral badge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SafetyLabel {
    /// Emergency services nearby.
    Safe,
    /// No emergency services found nearby.
    NotSafe,
    /// Any other label.
    Other(String),
}

impl SafetyLabel {
    /// Badge color for this label.
    pub fn badge(&self) -> BadgeColor {
        match self {
            Self::Safe => BadgeColor::Green,
            Self::NotSafe => BadgeColor::Red,
            Self::Other(_) => BadgeColor::Yellow,
        }
    }

    /// Label text as sent on the wire.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Safe => "Safe",
            Self::NotSafe => "Not Safe",
            Self::Other(label) => label,
        }
    }
}

impl From<String> for SafetyLabel {
    fn from(label: String) -> Self {
        match label.as_str() {
            "Safe" => Self::Safe,
            "Not Safe" => Self::NotSafe,
            _ => Self::Other(label),
        }
    }
}

impl From<SafetyLabel> for String {
    fn from(label: SafetyLabel) -> Self {
        label.as_str().to_string()
    }
}

impl fmt::Display for SafetyLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Color of the safety badge shown next to a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BadgeColor {
    /// `Safe`
    Green,
    /// `Not Safe`
    Red,
    /// Anything else
    Yellow,
}

/// A ranked route returned by the route API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    /// Rank of the route in the response, best first.
    pub route_index: u32,
    /// Total distance in meters.
    pub distance: u64,
    /// Estimated duration in seconds.
    pub duration: u64,
    /// Safety classification.
    pub safety: SafetyLabel,
    /// Traffic hint (`"Fast"` or `"Slow"`).
    pub traffic_info: String,
    /// Police stations found near the route.
    pub police_stations: u32,
    /// Hospitals found near the route.
    pub hospitals: u32,
    /// Route legs with polylines.
    #[serde(default)]
    pub directions: Vec<Direction>,
    /// First point of the route.
    pub start_point: Coordinate,
    /// Last point of the route; navigation targets this point.
    pub end_point: Coordinate,
}

/// Envelope returned by `GET /v1/get-route`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteResponse {
    /// Status code reported inside the envelope.
    pub status_code: u16,
    /// Ranked routes. Accepted as an array or as a JSON-encoded string.
    #[serde(deserialize_with = "deserialize_routes")]
    pub body: Vec<Route>,
}

impl RouteResponse {
    /// Decode a response body.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Decode`] if the payload is not a valid
    /// envelope.
    pub fn from_json(bytes: &[u8]) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

fn deserialize_routes<'de, D>(deserializer: D) -> Result<Vec<Route>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Body {
        Routes(Vec<Route>),
        Encoded(String),
    }

    match Body::deserialize(deserializer)? {
        Body::Routes(routes) => Ok(routes),
        Body::Encoded(text) => serde_json::from_str(&text).map_err(serde::de::Error::custom),
    }
}

/// Origin and destination of a route query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteQuery {
    /// Where the trip starts.
    pub start: Coordinate,
    /// Where the trip ends.
    pub end: Coordinate,
}

impl RouteQuery {
    /// Query parameters in the order the API documents them.
    pub fn query_pairs(&self) -> [(&'static str, f64); 4] {
        [
            ("start_lat", self.start.latitude),
            ("start_lon", self.start.longitude),
            ("end_lat", self.end.latitude),
            ("end_lon", self.end.longitude),
        ]
    }
}
