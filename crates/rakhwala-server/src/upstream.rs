//! Routing provider client (TomTom `calculateRoute`).

use std::time::Duration;

use rakhwala_proto::{Direction, RouteQuery, Summary, location::format_degrees};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::ServerError;

/// Public TomTom API root.
pub const DEFAULT_UPSTREAM_URL: &str = "https://api.tomtom.com/";

/// A route alternative as returned by the provider.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UpstreamRoute {
    /// Whole-route totals.
    pub summary: Summary,
    /// Legs with their polylines.
    #[serde(default)]
    pub legs: Vec<Direction>,
}

#[derive(Deserialize)]
struct CalculateRouteResponse {
    #[serde(default)]
    routes: Vec<UpstreamRoute>,
}

/// Client for the provider's route calculation endpoint.
#[derive(Debug, Clone)]
pub struct RouteProvider {
    client: reqwest::Client,
    base: reqwest::Url,
    api_key: String,
    max_alternatives: u32,
}

impl RouteProvider {
    /// Build a provider client rooted at `base_url`.
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        max_alternatives: u32,
        timeout: Duration,
    ) -> Result<Self, ServerError> {
        let mut base =
            reqwest::Url::parse(base_url).map_err(|e| ServerError::Config(format!("upstream url {base_url}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(ServerError::Config(format!("upstream url {base_url} cannot be a base")));
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServerError::Config(e.to_string()))?;

        Ok(Self { client, base, api_key: api_key.into(), max_alternatives })
    }

    /// Resolved request URL for `query`, including the API key.
    pub fn url(&self, query: &RouteQuery) -> Result<reqwest::Url, ServerError> {
        let locations = format!(
            "{},{}:{},{}",
            format_degrees(query.start.latitude),
            format_degrees(query.start.longitude),
            format_degrees(query.end.latitude),
            format_degrees(query.end.longitude),
        );
        let mut url = self
            .base
            .join(&format!("routing/1/calculateRoute/{locations}/json"))
            .map_err(|e| ServerError::Config(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("maxAlternatives", &self.max_alternatives.to_string())
            .append_pair("key", &self.api_key);
        Ok(url)
    }

    /// Fetch route alternatives between the query's endpoints.
    ///
    /// A non-success status yields an empty list; the caller then answers
    /// with no routes rather than an error.
    pub async fn routes(&self, query: &RouteQuery) -> Result<Vec<UpstreamRoute>, ServerError> {
        let response = self
            .client
            .get(self.url(query)?)
            .send()
            .await
            .map_err(|e| ServerError::Upstream(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "routing provider rejected request");
            return Ok(Vec::new());
        }

        let body: CalculateRouteResponse =
            response.json().await.map_err(|e| ServerError::Upstream(e.to_string()))?;
        debug!(count = body.routes.len(), "upstream routes received");
        Ok(body.routes)
    }
}
