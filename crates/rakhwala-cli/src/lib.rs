//! Desktop companion for Rakhwala.
//!
//! The subcommands reuse the same core components as the device app:
//! the access code comes from [`AccessCodeStore`] over a redb file, tracking
//! follows `locations/<code>` through any [`RemoteStore`], and route queries
//! go through any [`RouteSource`]. `main.rs` only wires real adapters in.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::io::Write;

use rakhwala_client::ClientError;
use rakhwala_core::{
    AccessCodeStore, Environment, LocalStore, MapView, RemoteStore, RouteError, RouteSource, SafetyError,
    StorageError, TrackUpdate, decode_update, navigation_intent,
};
use rakhwala_proto::{AccessCode, BadgeColor, Coordinate, LocationSample, ProtocolError, Route, RouteQuery, StorePath};
use thiserror::Error;

/// Failures surfaced to the terminal.
#[derive(Error, Debug)]
pub enum CliError {
    /// Argument could not be parsed.
    #[error("{0}")]
    Usage(String),

    /// Local state file unusable.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Malformed code, coordinate or record.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Network adapter could not be built.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Route query failed.
    #[error(transparent)]
    Route(#[from] RouteError),

    /// Workflow failure.
    #[error(transparent)]
    Safety(#[from] SafetyError),

    /// Output could not be written.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Parse `lat,lon` into a validated coordinate.
pub fn parse_coordinate(text: &str) -> Result<Coordinate, CliError> {
    let (lat, lon) = text
        .split_once(',')
        .ok_or_else(|| CliError::Usage(format!("expected lat,lon, got {text:?}")))?;
    let parse = |part: &str| {
        part.trim().parse::<f64>().map_err(|e| CliError::Usage(format!("invalid coordinate {part:?}: {e}")))
    };
    let sample = LocationSample::new(parse(lat)?, parse(lon)?)?;
    Ok(Coordinate::from(sample))
}

/// The device access code, created on first use.
pub fn access_code<S: LocalStore, E: Environment>(storage: S, env: &E) -> Result<AccessCode, CliError> {
    Ok(AccessCodeStore::new(storage).get_or_create(env)?)
}

/// Follow the location shared under `code`, writing one line per update.
///
/// Returns after `limit` updates, or when the subscription closes.
pub async fn track<W: Write>(
    remote: &dyn RemoteStore,
    code: AccessCode,
    out: &mut W,
    limit: Option<usize>,
) -> Result<(), CliError> {
    let mut subscription = remote.subscribe(&StorePath::location(code));
    let mut view = MapView::default();
    let mut seen = 0;

    while limit.is_none_or(|limit| seen < limit) {
        let Some(item) = subscription.next().await else {
            tracing::debug!(%code, "subscription closed");
            break;
        };
        let update = decode_update(item);
        view.apply(&update);
        writeln!(out, "{}", describe_update(&update, &view))?;
        seen += 1;
    }
    Ok(())
}

/// One line describing a tracking update.
pub fn describe_update(update: &TrackUpdate, view: &MapView) -> String {
    match update {
        TrackUpdate::Position(sample) => {
            format!("{:.6},{:.6} zoom {} {}", sample.latitude, sample.longitude, view.zoom, sample.maps_url())
        },
        TrackUpdate::NoData => "no location shared under this code".to_string(),
        TrackUpdate::Error(message) => format!("error: {message}"),
    }
}

/// Query routes and write them best first.
pub async fn routes<W: Write>(
    source: &dyn RouteSource,
    query: RouteQuery,
    referrer: &str,
    out: &mut W,
) -> Result<usize, CliError> {
    let routes = source.routes(&query).await?;
    if routes.is_empty() {
        writeln!(out, "no routes found")?;
    }
    for route in &routes {
        writeln!(out, "{}", describe_route(route))?;
        writeln!(out, "    {}", navigation_intent(route, referrer).uri)?;
    }
    Ok(routes.len())
}

/// One line summarising a route.
pub fn describe_route(route: &Route) -> String {
    let badge = match route.safety.badge() {
        BadgeColor::Green => "green",
        BadgeColor::Red => "red",
        BadgeColor::Yellow => "yellow",
    };
    format!(
        "#{} {} [{badge}] {:.1} km, {} min, {}, police {}, hospitals {}",
        route.route_index,
        route.safety,
        route.distance as f64 / 1000.0,
        route.duration.div_ceil(60),
        route.traffic_info,
        route.police_stations,
        route.hospitals,
    )
}
