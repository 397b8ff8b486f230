//! Emergency services near a route.

use async_trait::async_trait;
use rakhwala_core::Environment;
use rakhwala_proto::RouteQuery;

/// Largest count the random source reports per category.
pub const MAX_RANDOM_PLACES: u32 = 5;

/// Police stations and hospitals found along a trip.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NearbyPlaces {
    /// Police stations.
    pub police: u32,
    /// Hospitals.
    pub hospitals: u32,
}

impl NearbyPlaces {
    /// Whether any emergency service was found.
    pub fn any(&self) -> bool {
        self.police > 0 || self.hospitals > 0
    }
}

/// Source of nearby-place counts for a trip.
#[async_trait]
pub trait PlacesSource: Send + Sync + 'static {
    /// Counts for the area between the query's endpoints.
    async fn nearby(&self, query: &RouteQuery) -> NearbyPlaces;
}

/// Placeholder source drawing each count uniformly from
/// `0..=MAX_RANDOM_PLACES`.
///
/// Stands in until a real points-of-interest lookup is wired up.
#[derive(Debug, Clone)]
pub struct RandomPlaces<E> {
    env: E,
}

impl<E: Environment> RandomPlaces<E> {
    /// Draw counts from `env`'s randomness.
    pub fn new(env: E) -> Self {
        Self { env }
    }
}

#[async_trait]
impl<E: Environment> PlacesSource for RandomPlaces<E> {
    async fn nearby(&self, _query: &RouteQuery) -> NearbyPlaces {
        let bound = u64::from(MAX_RANDOM_PLACES) + 1;
        NearbyPlaces {
            police: self.env.random_below(bound) as u32,
            hospitals: self.env.random_below(bound) as u32,
        }
    }
}

/// Source reporting the same counts for every trip.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedPlaces(pub NearbyPlaces);

#[async_trait]
impl PlacesSource for FixedPlaces {
    async fn nearby(&self, _query: &RouteQuery) -> NearbyPlaces {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use rakhwala_harness::SimEnv;
    use rakhwala_proto::Coordinate;

    use super::*;

    fn query() -> RouteQuery {
        RouteQuery {
            start: Coordinate { latitude: 18.5, longitude: 73.8 },
            end: Coordinate { latitude: 18.6, longitude: 73.9 },
        }
    }

    #[tokio::test]
    async fn random_counts_stay_in_range() {
        let places = RandomPlaces::new(SimEnv::with_seed(7));
        let mut seen_zero = false;
        let mut seen_max = false;
        for _ in 0..500 {
            let nearby = places.nearby(&query()).await;
            assert!(nearby.police <= MAX_RANDOM_PLACES);
            assert!(nearby.hospitals <= MAX_RANDOM_PLACES);
            seen_zero |= nearby.police == 0;
            seen_max |= nearby.police == MAX_RANDOM_PLACES;
        }
        assert!(seen_zero && seen_max);
    }

    #[tokio::test]
    async fn same_seed_same_counts() {
        let a = RandomPlaces::new(SimEnv::with_seed(42));
        let b = RandomPlaces::new(SimEnv::with_seed(42));
        for _ in 0..20 {
            assert_eq!(a.nearby(&query()).await, b.nearby(&query()).await);
        }
    }

    #[test]
    fn any_means_at_least_one_service() {
        assert!(!NearbyPlaces::default().any());
        assert!(NearbyPlaces { police: 0, hospitals: 1 }.any());
        assert!(NearbyPlaces { police: 3, hospitals: 0 }.any());
    }
}
