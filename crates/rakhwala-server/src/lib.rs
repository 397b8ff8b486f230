//! Rakhwala safe-route server.
//!
//! Answers `GET /v1/get-route?start_lat&start_lon&end_lat&end_lon` with up to
//! two route alternatives ranked by nearby emergency services and travel
//! time.
//!
//! # Components
//!
//! - [`RouteProvider`]: upstream routing provider client
//! - [`PlacesSource`]: nearby police station and hospital counts
//! - [`scoring`]: scoring, labelling and ranking
//! - [`Server`]: axum listener tying them together

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;
pub mod places;
pub mod scoring;
pub mod upstream;

use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    Json, Router,
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
pub use error::ServerError;
pub use places::{FixedPlaces, NearbyPlaces, PlacesSource, RandomPlaces};
use rakhwala_proto::{Coordinate, LocationSample, RouteQuery, RouteResponse};
use serde::Deserialize;
use serde_json::json;
pub use upstream::{DEFAULT_UPSTREAM_URL, RouteProvider, UpstreamRoute};

/// Server configuration for the production runtime.
#[derive(Debug, Clone)]
pub struct ServerRuntimeConfig {
    /// Address to bind to (e.g., "0.0.0.0:8080")
    pub bind_address: String,
    /// Routing provider API root
    pub upstream_url: String,
    /// Routing provider API key
    pub api_key: String,
    /// Alternatives requested from the provider
    pub max_alternatives: u32,
    /// Timeout for one provider request
    pub upstream_timeout: Duration,
}

impl Default for ServerRuntimeConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            upstream_url: DEFAULT_UPSTREAM_URL.to_string(),
            api_key: String::new(),
            max_alternatives: 2,
            upstream_timeout: Duration::from_secs(10),
        }
    }
}

struct AppState {
    provider: RouteProvider,
    places: Arc<dyn PlacesSource>,
}

/// Production route server.
pub struct Server {
    listener: tokio::net::TcpListener,
    router: Router,
}

impl Server {
    /// Bind the listener and build the request router.
    pub async fn bind(config: ServerRuntimeConfig, places: Arc<dyn PlacesSource>) -> Result<Self, ServerError> {
        if config.api_key.is_empty() {
            tracing::warn!("no routing provider API key configured; upstream requests will be rejected");
        }

        let provider =
            RouteProvider::new(&config.upstream_url, config.api_key, config.max_alternatives, config.upstream_timeout)?;
        let listener = tokio::net::TcpListener::bind(&config.bind_address)
            .await
            .map_err(|e| ServerError::Config(format!("bind {}: {e}", config.bind_address)))?;

        Ok(Self { listener, router: router(provider, places) })
    }

    /// Local address the server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve requests until the process stops or the listener fails.
    pub async fn run(self) -> Result<(), ServerError> {
        tracing::info!("Server listening on {}", self.local_addr()?);
        axum::serve(self.listener, self.router).await?;
        Ok(())
    }
}

fn router(provider: RouteProvider, places: Arc<dyn PlacesSource>) -> Router {
    Router::new()
        .route("/v1/get-route", get(get_route))
        .with_state(Arc::new(AppState { provider, places }))
}

#[derive(Debug, Deserialize)]
struct RouteParams {
    start_lat: f64,
    start_lon: f64,
    end_lat: f64,
    end_lon: f64,
}

impl RouteParams {
    fn query(&self) -> Result<RouteQuery, rakhwala_proto::ProtocolError> {
        let start = LocationSample::new(self.start_lat, self.start_lon)?;
        let end = LocationSample::new(self.end_lat, self.end_lon)?;
        Ok(RouteQuery { start: Coordinate::from(start), end: Coordinate::from(end) })
    }
}

async fn get_route(
    State(state): State<Arc<AppState>>,
    params: Result<Query<RouteParams>, QueryRejection>,
) -> Response {
    let query = match params {
        Ok(Query(params)) => match params.query() {
            Ok(query) => query,
            Err(err) => return failure(StatusCode::BAD_REQUEST, &err.to_string()),
        },
        Err(rejection) => return failure(StatusCode::BAD_REQUEST, &rejection.body_text()),
    };

    let (alternatives, places) = tokio::join!(state.provider.routes(&query), state.places.nearby(&query));
    let alternatives = match alternatives {
        Ok(alternatives) => alternatives,
        Err(err) => {
            tracing::error!(error = %err, "route lookup failed");
            return failure(StatusCode::BAD_GATEWAY, &err.to_string());
        },
    };

    let routes = scoring::rank(alternatives, places);
    tracing::debug!(count = routes.len(), police = places.police, hospitals = places.hospitals, "routes ranked");
    Json(RouteResponse { status_code: StatusCode::OK.as_u16(), body: routes }).into_response()
}

fn failure(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "statusCode": status.as_u16(), "message": message }))).into_response()
}
