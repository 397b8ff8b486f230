//! Route queries and hand-off to external navigation.

use async_trait::async_trait;
use rakhwala_proto::{Route, RouteQuery, location::format_degrees};

use crate::RouteError;

/// Referrer tag identifying this app to the navigation handler.
pub const DEFAULT_REFERRER: &str = "android-app://com.mnvpatni.rakhwala";

/// Source of ranked, safety-scored routes.
///
/// The order of the returned list is the ranking; callers never re-sort.
#[async_trait]
pub trait RouteSource: Send + Sync + 'static {
    /// Fetch routes between the query's endpoints.
    async fn routes(&self, query: &RouteQuery) -> Result<Vec<Route>, RouteError>;
}

/// Request to open turn-by-turn navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationIntent {
    /// `google.navigation:q=<lat>,<lon>`
    pub uri: String,
    /// Calling app.
    pub referrer: String,
}

/// Navigation intent targeting the route's end point.
pub fn navigation_intent(route: &Route, referrer: &str) -> NavigationIntent {
    NavigationIntent {
        uri: format!(
            "google.navigation:q={},{}",
            format_degrees(route.end_point.latitude),
            format_degrees(route.end_point.longitude)
        ),
        referrer: referrer.to_string(),
    }
}
