//! Remote hierarchical key-value store.
//!
//! The store holds JSON values addressed by [`StorePath`]. Writers overwrite,
//! append (`push`) or delete; readers fetch once or subscribe to a path and
//! receive the whole value at that path on every change.

mod chaotic;
mod memory;

use async_trait::async_trait;
use rakhwala_proto::StorePath;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;

pub use chaotic::ChaoticRemoteStore;
pub use memory::MemoryRemoteStore;

/// Value at a path. `None` when nothing is stored there.
pub type Snapshot = Option<Value>;

/// Remote store failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// Store unreachable or the request failed in transit.
    #[error("remote store unavailable: {0}")]
    Unavailable(String),

    /// Access rules rejected the request, or a subscription was cancelled.
    #[error("remote store denied request: {0}")]
    Denied(String),

    /// Stored value did not match the expected shape.
    #[error("invalid remote value: {0}")]
    Decode(String),
}

/// Remote key-value store.
///
/// Last write wins. Subscriptions see every committed write to an
/// overlapping path, in commit order.
#[async_trait]
pub trait RemoteStore: Send + Sync + 'static {
    /// Read the value at `path`.
    async fn get(&self, path: &StorePath) -> Result<Snapshot, RemoteError>;

    /// Overwrite the value at `path`. Writing `null` deletes.
    async fn set(&self, path: &StorePath, value: Value) -> Result<(), RemoteError>;

    /// Store `value` under a fresh child key of `path` and return the key.
    ///
    /// Keys from one store sort in creation order.
    async fn push(&self, path: &StorePath, value: Value) -> Result<String, RemoteError>;

    /// Delete the value at `path`. Deleting an absent path succeeds.
    async fn remove(&self, path: &StorePath) -> Result<(), RemoteError>;

    /// Children of `path` whose `child` field equals `value`, as
    /// `(key, value)` pairs in key order.
    async fn query_equal(
        &self,
        path: &StorePath,
        child: &str,
        value: &Value,
    ) -> Result<Vec<(String, Value)>, RemoteError>;

    /// Watch `path`.
    ///
    /// The subscription first yields the current value, then the new value
    /// after every write that touches `path`. Transient failures arrive as
    /// `Err(Unavailable)` items and the watch continues; `Err(Denied)` ends it.
    fn subscribe(&self, path: &StorePath) -> Subscription;
}

/// Stream of snapshots for a watched path.
///
/// Dropping the subscription detaches it from the store.
#[derive(Debug)]
pub struct Subscription {
    rx: mpsc::UnboundedReceiver<Result<Snapshot, RemoteError>>,
}

impl Subscription {
    /// Wrap the receiving half of a snapshot channel.
    pub fn new(rx: mpsc::UnboundedReceiver<Result<Snapshot, RemoteError>>) -> Self {
        Self { rx }
    }

    /// Wait for the next snapshot. `None` once the store side is gone.
    pub async fn next(&mut self) -> Option<Result<Snapshot, RemoteError>> {
        self.rx.recv().await
    }
}
