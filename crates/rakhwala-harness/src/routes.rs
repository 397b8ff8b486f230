//! Canned route sources.

#![allow(clippy::disallowed_types, reason = "Synchronous locking operations only")]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rakhwala_core::{RouteError, RouteSource};
use rakhwala_proto::{Route, RouteQuery};

/// Route source that answers every query with the same result and records
/// the queries it saw.
#[derive(Clone)]
pub struct StaticRouteSource {
    result: Result<Vec<Route>, RouteError>,
    queries: Arc<Mutex<Vec<RouteQuery>>>,
}

impl StaticRouteSource {
    /// Always return `routes`.
    pub fn new(routes: Vec<Route>) -> Self {
        Self { result: Ok(routes), queries: Arc::default() }
    }

    /// Always fail with `error`.
    pub fn failing(error: RouteError) -> Self {
        Self { result: Err(error), queries: Arc::default() }
    }

    /// Queries received so far.
    #[allow(clippy::expect_used)]
    pub fn queries(&self) -> Vec<RouteQuery> {
        self.queries.lock().expect("Mutex poisoned").clone()
    }
}

#[async_trait]
impl RouteSource for StaticRouteSource {
    #[allow(clippy::expect_used)]
    async fn routes(&self, query: &RouteQuery) -> Result<Vec<Route>, RouteError> {
        self.queries.lock().expect("Mutex poisoned").push(*query);
        self.result.clone()
    }
}
