//! HTTP client for the safe-route API.

use std::time::Duration;

use async_trait::async_trait;
use rakhwala_core::{RouteError, RouteSource};
use rakhwala_proto::{Route, RouteQuery, RouteResponse};
use tracing::{debug, warn};

use crate::{ClientError, error::parse_base};

/// Deployed route API.
pub const DEFAULT_BASE_URL: &str = "https://ua7cl2ha8a.execute-api.ap-south-1.amazonaws.com/";

const ROUTE_ENDPOINT: &str = "v1/get-route";

/// Route client configuration.
#[derive(Debug, Clone)]
pub struct RouteClientConfig {
    /// API root; `v1/get-route` is resolved against it.
    pub base_url: String,
    /// Whole-request timeout. `None` keeps the HTTP client default.
    pub timeout: Option<Duration>,
}

impl Default for RouteClientConfig {
    fn default() -> Self {
        Self { base_url: DEFAULT_BASE_URL.to_string(), timeout: None }
    }
}

/// [`RouteSource`] backed by the route API.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct HttpRouteSource {
    client: reqwest::Client,
    endpoint: reqwest::Url,
}

impl HttpRouteSource {
    /// Build a client for `config.base_url`.
    pub fn new(config: &RouteClientConfig) -> Result<Self, ClientError> {
        let endpoint = parse_base(&config.base_url)?.join(ROUTE_ENDPOINT).map_err(|e| {
            ClientError::InvalidUrl { url: config.base_url.clone(), reason: e.to_string() }
        })?;
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;
        Ok(Self { client, endpoint })
    }

    /// Fully resolved endpoint URL (without query).
    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }
}

#[async_trait]
impl RouteSource for HttpRouteSource {
    async fn routes(&self, query: &RouteQuery) -> Result<Vec<Route>, RouteError> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&query.query_pairs())
            .send()
            .await
            .map_err(|e| RouteError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "route API rejected request");
            return Err(RouteError::Status(status.as_u16()));
        }

        let bytes = response.bytes().await.map_err(|e| RouteError::Transport(e.to_string()))?;
        let envelope = RouteResponse::from_json(&bytes)?;

        // The API wraps its own status; a failure there is reported the same
        // way as an HTTP failure.
        if !(200..300).contains(&envelope.status_code) {
            warn!(status = envelope.status_code, "route API envelope reported failure");
            return Err(RouteError::Status(envelope.status_code));
        }

        debug!(count = envelope.body.len(), "routes received");
        Ok(envelope.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_resolves_against_base() {
        let source = HttpRouteSource::new(&RouteClientConfig::default()).unwrap();
        assert_eq!(source.endpoint(), "https://ua7cl2ha8a.execute-api.ap-south-1.amazonaws.com/v1/get-route");

        let config = RouteClientConfig { base_url: "http://127.0.0.1:9000/stage".into(), ..Default::default() };
        let source = HttpRouteSource::new(&config).unwrap();
        assert_eq!(source.endpoint(), "http://127.0.0.1:9000/stage/v1/get-route");
    }

    #[test]
    fn invalid_base_rejected() {
        let config = RouteClientConfig { base_url: "::".into(), ..Default::default() };
        assert!(matches!(HttpRouteSource::new(&config), Err(ClientError::InvalidUrl { .. })));
    }
}
