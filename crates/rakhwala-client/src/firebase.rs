//! Realtime database adapter over the REST interface.
//!
//! Every path maps to `<database_url>/<path>.json`:
//!
//! | Operation      | Request                                           |
//! |----------------|---------------------------------------------------|
//! | `get`          | `GET`                                             |
//! | `set`          | `PUT` with the value as body                      |
//! | `push`         | `POST`, answered with `{"name": "<key>"}`         |
//! | `remove`       | `DELETE`                                          |
//! | `query_equal`  | `GET ?orderBy="<child>"&equalTo=<json>`           |
//!
//! The REST interface has no push channel usable from here, so
//! subscriptions poll the path and forward a snapshot only when it differs
//! from the previous one.

use std::time::Duration;

use async_trait::async_trait;
use rakhwala_core::{RemoteError, RemoteStore, Snapshot, Subscription};
use rakhwala_proto::StorePath;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::{ClientError, error::parse_base};

/// Realtime database connection settings.
#[derive(Debug, Clone)]
pub struct FirebaseConfig {
    /// Database root, e.g. `https://<project>.firebaseio.com/`.
    pub database_url: String,
    /// Token sent as the `auth` query parameter.
    pub auth: Option<String>,
    /// How often subscriptions re-read their path.
    pub poll_interval: Duration,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl FirebaseConfig {
    /// Settings for `database_url` with default timings and no token.
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            auth: None,
            poll_interval: Duration::from_secs(2),
            timeout: Duration::from_secs(10),
        }
    }
}

/// [`RemoteStore`] backed by a realtime database.
#[derive(Debug, Clone)]
pub struct FirebaseStore {
    client: reqwest::Client,
    root: reqwest::Url,
    auth: Option<String>,
    poll_interval: Duration,
}

#[derive(Deserialize)]
struct PushResponse {
    name: String,
}

impl FirebaseStore {
    /// Connect to the database described by `config`.
    ///
    /// No request is made until the first operation.
    pub fn new(config: &FirebaseConfig) -> Result<Self, ClientError> {
        let root = parse_base(&config.database_url)?;
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, root, auth: config.auth.clone(), poll_interval: config.poll_interval })
    }

    fn url(&self, path: &StorePath) -> Result<reqwest::Url, RemoteError> {
        let mut url = self.root.clone();
        let mut segments: Vec<String> = path.segments().map(str::to_string).collect();
        if let Some(last) = segments.last_mut() {
            last.push_str(".json");
        }
        url.path_segments_mut()
            .map_err(|()| RemoteError::Unavailable(format!("invalid database url {}", self.root)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, path: &StorePath) -> Result<RequestBuilder, RemoteError> {
        let builder = self.client.request(method, self.url(path)?);
        Ok(match &self.auth {
            Some(token) => builder.query(&[("auth", token)]),
            None => builder,
        })
    }

    async fn fetch(&self, path: &StorePath) -> Result<Snapshot, RemoteError> {
        let value: Value = send(self.request(Method::GET, path)?).await?;
        Ok(non_null(value))
    }
}

#[async_trait]
impl RemoteStore for FirebaseStore {
    async fn get(&self, path: &StorePath) -> Result<Snapshot, RemoteError> {
        self.fetch(path).await
    }

    async fn set(&self, path: &StorePath, value: Value) -> Result<(), RemoteError> {
        let _: Value = send(self.request(Method::PUT, path)?.json(&value)).await?;
        Ok(())
    }

    async fn push(&self, path: &StorePath, value: Value) -> Result<String, RemoteError> {
        let response: PushResponse = send(self.request(Method::POST, path)?.json(&value)).await?;
        Ok(response.name)
    }

    async fn remove(&self, path: &StorePath) -> Result<(), RemoteError> {
        let _: Value = send(self.request(Method::DELETE, path)?).await?;
        Ok(())
    }

    async fn query_equal(
        &self,
        path: &StorePath,
        child: &str,
        value: &Value,
    ) -> Result<Vec<(String, Value)>, RemoteError> {
        let order_by = Value::String(child.to_string()).to_string();
        let equal_to = value.to_string();
        let request = self
            .request(Method::GET, path)?
            .query(&[("orderBy", order_by.as_str()), ("equalTo", equal_to.as_str())]);

        let matches: Value = send(request).await?;
        match matches {
            Value::Object(children) => {
                let mut children: Vec<(String, Value)> = children.into_iter().collect();
                children.sort_by(|a, b| a.0.cmp(&b.0));
                Ok(children)
            },
            Value::Null => Ok(Vec::new()),
            other => Err(RemoteError::Decode(format!("expected object from query, got {other}"))),
        }
    }

    /// Spawns the polling task on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    fn subscribe(&self, path: &StorePath) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let store = self.clone();
        let path = path.clone();
        tokio::spawn(async move { store.poll(path, tx).await });
        Subscription::new(rx)
    }
}

impl FirebaseStore {
    async fn poll(self, path: StorePath, tx: mpsc::UnboundedSender<Result<Snapshot, RemoteError>>) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut last: Option<Snapshot> = None;

        loop {
            ticker.tick().await;
            if tx.is_closed() {
                debug!(%path, "subscription dropped");
                return;
            }

            match self.fetch(&path).await {
                Ok(snapshot) => {
                    if last.as_ref() == Some(&snapshot) {
                        continue;
                    }
                    last = Some(snapshot.clone());
                    if tx.send(Ok(snapshot)).is_err() {
                        return;
                    }
                },
                Err(err @ RemoteError::Unavailable(_)) => {
                    warn!(%path, error = %err, "poll failed");
                    // Re-deliver the value once the store is reachable again.
                    last = None;
                    if tx.send(Err(err)).is_err() {
                        return;
                    }
                },
                Err(err) => {
                    warn!(%path, error = %err, "subscription ended");
                    let _ = tx.send(Err(err));
                    return;
                },
            }
        }
    }
}

async fn send<T: serde::de::DeserializeOwned>(request: RequestBuilder) -> Result<T, RemoteError> {
    let response = request.send().await.map_err(|e| RemoteError::Unavailable(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(status_error(status, body.trim()));
    }

    let bytes = response.bytes().await.map_err(|e| RemoteError::Unavailable(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| RemoteError::Decode(e.to_string()))
}

fn status_error(status: StatusCode, body: &str) -> RemoteError {
    let message = if body.is_empty() { status.to_string() } else { format!("{status}: {body}") };
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RemoteError::Denied(message),
        _ => RemoteError::Unavailable(message),
    }
}

fn non_null(value: Value) -> Snapshot {
    if value.is_null() { None } else { Some(value) }
}
