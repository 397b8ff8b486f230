//! Route server end to end: fake routing provider, real listener, real client.

use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{Arc, Mutex},
};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use rakhwala_client::{HttpRouteSource, RouteClientConfig};
use rakhwala_core::{RouteError, RouteSource};
use rakhwala_proto::{Coordinate, RouteQuery, SafetyLabel};
use rakhwala_server::{FixedPlaces, NearbyPlaces, Server, ServerRuntimeConfig};
use serde_json::{Value, json};

const API_KEY: &str = "test-key";

#[derive(Clone, Default)]
struct Provider {
    requests: Arc<Mutex<Vec<(String, HashMap<String, String>)>>>,
}

fn alternative(duration: u64, end_lat: f64) -> Value {
    let summary = json!({"lengthInMeters": duration * 8, "travelTimeInSeconds": duration});
    json!({
        "summary": summary,
        "legs": [{
            "summary": summary,
            "points": [
                {"latitude": 18.52, "longitude": 73.85},
                {"latitude": 18.54, "longitude": 73.88},
                {"latitude": end_lat, "longitude": 73.91}
            ]
        }]
    })
}

async fn calculate_route(
    State(provider): State<Provider>,
    Path(locations): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    provider.requests.lock().unwrap().push((locations, params.clone()));
    if params.get("key").map(String::as_str) != Some(API_KEY) {
        return (StatusCode::FORBIDDEN, Json(json!({"detailedError": {"code": "Forbidden"}}))).into_response();
    }
    Json(json!({
        "formatVersion": "0.0.12",
        "routes": [alternative(2400, 18.561), alternative(900, 18.562), alternative(1500, 18.563)]
    }))
    .into_response()
}

async fn serve_provider(provider: Provider) -> SocketAddr {
    let app = Router::new()
        .route("/routing/1/calculateRoute/:locations/json", get(calculate_route))
        .with_state(provider);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    addr
}

async fn serve_routes(upstream: SocketAddr, api_key: &str, places: NearbyPlaces) -> SocketAddr {
    let config = ServerRuntimeConfig {
        bind_address: "127.0.0.1:0".to_string(),
        upstream_url: format!("http://{upstream}"),
        api_key: api_key.to_string(),
        ..Default::default()
    };
    let server = Server::bind(config, Arc::new(FixedPlaces(places))).await.unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(async move { server.run().await.unwrap() });
    addr
}

fn client(addr: SocketAddr) -> HttpRouteSource {
    HttpRouteSource::new(&RouteClientConfig { base_url: format!("http://{addr}"), ..Default::default() }).unwrap()
}

fn query() -> RouteQuery {
    RouteQuery {
        start: Coordinate { latitude: 18.52, longitude: 73.85 },
        end: Coordinate { latitude: 18.56, longitude: 73.91 },
    }
}

#[tokio::test]
async fn ranks_top_two_for_the_client() {
    let provider = Provider::default();
    let upstream = serve_provider(provider.clone()).await;
    let addr = serve_routes(upstream, API_KEY, NearbyPlaces { police: 1, hospitals: 2 }).await;

    let routes = client(addr).routes(&query()).await.unwrap();

    assert_eq!(routes.len(), 2);
    assert_eq!((routes[0].duration, routes[0].route_index), (900, 0));
    assert_eq!((routes[1].duration, routes[1].route_index), (1500, 1));
    assert_eq!(routes[0].safety, SafetyLabel::Safe);
    assert_eq!(routes[0].traffic_info, "Fast");
    assert_eq!(routes[0].hospitals, 2);
    assert_eq!(routes[0].end_point, Coordinate { latitude: 18.562, longitude: 73.91 });
    assert_eq!(routes[0].directions[0].points.len(), 3);

    let requests = provider.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].0, "18.52,73.85:18.56,73.91");
    assert_eq!(requests[0].1["maxAlternatives"], "2");
}

#[tokio::test]
async fn no_services_means_not_safe() {
    let upstream = serve_provider(Provider::default()).await;
    let addr = serve_routes(upstream, API_KEY, NearbyPlaces::default()).await;

    let routes = client(addr).routes(&query()).await.unwrap();
    assert!(routes.iter().all(|r| r.safety == SafetyLabel::NotSafe));
}

#[tokio::test]
async fn rejected_upstream_yields_empty_list() {
    let upstream = serve_provider(Provider::default()).await;
    let addr = serve_routes(upstream, "wrong-key", NearbyPlaces::default()).await;

    assert!(client(addr).routes(&query()).await.unwrap().is_empty());
}

#[tokio::test]
async fn unreachable_upstream_is_gateway_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let upstream = listener.local_addr().unwrap();
    drop(listener);
    let addr = serve_routes(upstream, API_KEY, NearbyPlaces::default()).await;

    assert_eq!(client(addr).routes(&query()).await, Err(RouteError::Status(502)));
}

#[tokio::test]
async fn missing_or_invalid_parameters_are_bad_requests() {
    let upstream = serve_provider(Provider::default()).await;
    let addr = serve_routes(upstream, API_KEY, NearbyPlaces::default()).await;
    let http = reqwest::Client::new();

    let missing = http
        .get(format!("http://{addr}/v1/get-route?start_lat=18.5&start_lon=73.8&end_lat=18.6"))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status().as_u16(), 400);

    let invalid = http
        .get(format!("http://{addr}/v1/get-route?start_lat=95&start_lon=73.8&end_lat=18.6&end_lon=73.9"))
        .send()
        .await
        .unwrap();
    assert_eq!(invalid.status().as_u16(), 400);
    let body: Value = invalid.json().await.unwrap();
    assert_eq!(body["statusCode"], 400);
}
