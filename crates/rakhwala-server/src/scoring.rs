//! Safety scoring and ranking of route alternatives.
//!
//! A route earns 2 points per police station and 1.5 per hospital nearby,
//! and loses one point per hour of travel. Higher is better.

use rakhwala_proto::{Route, SafetyLabel};

use crate::{NearbyPlaces, upstream::UpstreamRoute};

/// Routes returned per query.
pub const MAX_RESULTS: usize = 2;

/// Trips shorter than this (in seconds) are tagged `"Fast"`.
pub const FAST_TRIP_SECS: u64 = 1800;

const POLICE_WEIGHT: f64 = 2.0;
const HOSPITAL_WEIGHT: f64 = 1.5;
const SECS_PER_HOUR: f64 = 3600.0;

/// Combined safety and travel-time score.
pub fn score(places: NearbyPlaces, duration_secs: u64) -> f64 {
    f64::from(places.police) * POLICE_WEIGHT + f64::from(places.hospitals) * HOSPITAL_WEIGHT
        - duration_secs as f64 / SECS_PER_HOUR
}

/// `"Fast"` or `"Slow"` depending on travel time.
pub fn traffic_label(duration_secs: u64) -> &'static str {
    if duration_secs < FAST_TRIP_SECS { "Fast" } else { "Slow" }
}

/// Score, sort best first and keep the top [`MAX_RESULTS`].
///
/// Alternatives without a polyline have no end point to navigate to and are
/// dropped before ranking. Ties keep provider order.
pub fn rank(alternatives: Vec<UpstreamRoute>, places: NearbyPlaces) -> Vec<Route> {
    let mut scored: Vec<(f64, UpstreamRoute)> = alternatives
        .into_iter()
        .filter(|route| route.legs.first().is_some_and(|leg| !leg.points.is_empty()))
        .map(|route| (score(places, route.summary.travel_time_in_seconds), route))
        .collect();

    scored.sort_by(|a, b| b.0.total_cmp(&a.0));

    scored
        .into_iter()
        .take(MAX_RESULTS)
        .enumerate()
        .filter_map(|(rank, (_, route))| to_route(rank as u32, route, places))
        .collect()
}

fn to_route(rank: u32, route: UpstreamRoute, places: NearbyPlaces) -> Option<Route> {
    let points = &route.legs.first()?.points;
    let start_point = *points.first()?;
    let end_point = *points.last()?;
    let duration = route.summary.travel_time_in_seconds;

    Some(Route {
        route_index: rank,
        distance: route.summary.length_in_meters,
        duration,
        safety: if places.any() { SafetyLabel::Safe } else { SafetyLabel::NotSafe },
        traffic_info: traffic_label(duration).to_string(),
        police_stations: places.police,
        hospitals: places.hospitals,
        directions: route.legs,
        start_point,
        end_point,
    })
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rakhwala_proto::{Coordinate, Direction, Summary};

    use super::*;

    fn alternative(duration: u64, points: usize) -> UpstreamRoute {
        let summary = Summary {
            length_in_meters: duration * 10,
            travel_time_in_seconds: duration,
            departure_time: String::new(),
            arrival_time: String::new(),
        };
        let points = (0..points)
            .map(|i| Coordinate { latitude: 18.5 + i as f64 * 0.01, longitude: 73.8 })
            .collect();
        UpstreamRoute { summary: summary.clone(), legs: vec![Direction { summary, points }] }
    }

    #[test]
    fn score_weights_services_and_hours() {
        let places = NearbyPlaces { police: 2, hospitals: 1 };
        assert!((score(places, 3600) - 4.5).abs() < 1e-9);
        assert!((score(NearbyPlaces::default(), 1800) + 0.5).abs() < 1e-9);
    }

    #[test]
    fn traffic_threshold() {
        assert_eq!(traffic_label(1799), "Fast");
        assert_eq!(traffic_label(1800), "Slow");
    }

    #[test]
    fn keeps_two_fastest_with_rank_indices() {
        let places = NearbyPlaces { police: 1, hospitals: 0 };
        let routes = rank(vec![alternative(2400, 3), alternative(600, 2), alternative(1200, 2)], places);

        assert_eq!(routes.len(), 2);
        assert_eq!(routes[0].duration, 600);
        assert_eq!(routes[1].duration, 1200);
        assert_eq!(routes[0].route_index, 0);
        assert_eq!(routes[1].route_index, 1);
        assert_eq!(routes[0].traffic_info, "Fast");
        assert_eq!(routes[0].safety, SafetyLabel::Safe);
        assert_eq!(routes[0].police_stations, 1);
    }

    #[test]
    fn endpoints_come_from_first_leg() {
        let routes = rank(vec![alternative(600, 3)], NearbyPlaces::default());

        assert_eq!(routes[0].start_point, Coordinate { latitude: 18.5, longitude: 73.8 });
        assert!((routes[0].end_point.latitude - 18.52).abs() < 1e-9);
        assert_eq!(routes[0].safety, SafetyLabel::NotSafe);
    }

    #[test]
    fn routes_without_points_are_dropped() {
        let mut no_legs = alternative(300, 2);
        no_legs.legs.clear();
        let routes = rank(vec![no_legs, alternative(300, 0), alternative(900, 2)], NearbyPlaces::default());

        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].duration, 900);
    }

    proptest! {
        #[test]
        fn prop_ranked_best_first(
            durations in prop::collection::vec(0u64..20_000, 0..6),
            police in 0u32..6,
            hospitals in 0u32..6,
        ) {
            let places = NearbyPlaces { police, hospitals };
            let routes = rank(durations.iter().map(|d| alternative(*d, 2)).collect(), places);

            prop_assert_eq!(routes.len(), durations.len().min(MAX_RESULTS));
            for pair in routes.windows(2) {
                prop_assert!(score(places, pair[0].duration) >= score(places, pair[1].duration));
            }
            for (i, route) in routes.iter().enumerate() {
                prop_assert_eq!(route.route_index as usize, i);
            }
        }
    }
}
