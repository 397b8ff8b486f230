#![allow(clippy::disallowed_types, reason = "Synchronous in-memory operations only")]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rakhwala_proto::StorePath;
use serde_json::{Map, Value};
use tokio::sync::mpsc;

use super::{RemoteError, RemoteStore, Snapshot, Subscription};

type Watcher = (StorePath, mpsc::UnboundedSender<Result<Snapshot, RemoteError>>);

/// In-memory remote store for tests and simulation.
///
/// Holds one JSON tree. Writes notify every live subscription whose path
/// overlaps the written path. Clones share the same tree, so two App
/// instances built on clones of one store observe each other's writes.
#[derive(Clone, Default)]
pub struct MemoryRemoteStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    root: Map<String, Value>,
    watchers: Vec<Watcher>,
    next_key: u64,
    offline: bool,
}

impl MemoryRemoteStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate losing (or regaining) connectivity. While offline every
    /// request fails with [`RemoteError::Unavailable`].
    #[allow(clippy::expect_used)]
    pub fn set_offline(&self, offline: bool) {
        self.inner.lock().expect("Mutex poisoned").offline = offline;
    }

    /// Cancel every live subscription with `reason`.
    #[allow(clippy::expect_used)]
    pub fn cancel_subscriptions(&self, reason: &str) {
        let watchers = std::mem::take(&mut self.inner.lock().expect("Mutex poisoned").watchers);
        for (_, tx) in watchers {
            let _ = tx.send(Err(RemoteError::Denied(reason.to_string())));
        }
    }

    /// Number of live subscriptions.
    #[allow(clippy::expect_used)]
    pub fn subscriber_count(&self) -> usize {
        let mut inner = self.inner.lock().expect("Mutex poisoned");
        inner.watchers.retain(|(_, tx)| !tx.is_closed());
        inner.watchers.len()
    }

    /// Read the value at `path` without going through the async API.
    #[allow(clippy::expect_used)]
    pub fn peek(&self, path: &StorePath) -> Snapshot {
        let inner = self.inner.lock().expect("Mutex poisoned");
        lookup(&inner.root, path).cloned()
    }

    #[allow(clippy::expect_used)]
    fn write(&self, path: &StorePath, value: Value) -> Result<(), RemoteError> {
        let mut inner = self.inner.lock().expect("Mutex poisoned");
        if inner.offline {
            return Err(RemoteError::Unavailable("offline".to_string()));
        }
        assign(&mut inner.root, path, value);
        inner.notify(path);
        Ok(())
    }

    #[allow(clippy::expect_used)]
    fn read(&self, path: &StorePath) -> Result<Snapshot, RemoteError> {
        let inner = self.inner.lock().expect("Mutex poisoned");
        if inner.offline {
            return Err(RemoteError::Unavailable("offline".to_string()));
        }
        Ok(lookup(&inner.root, path).cloned())
    }
}

impl Inner {
    fn notify(&mut self, written: &StorePath) {
        let Self { root, watchers, .. } = self;
        watchers.retain(|(path, tx)| {
            if !path.overlaps(written) {
                return !tx.is_closed();
            }
            tx.send(Ok(lookup(root, path).cloned())).is_ok()
        });
    }
}

#[async_trait]
impl RemoteStore for MemoryRemoteStore {
    async fn get(&self, path: &StorePath) -> Result<Snapshot, RemoteError> {
        self.read(path)
    }

    async fn set(&self, path: &StorePath, value: Value) -> Result<(), RemoteError> {
        self.write(path, value)
    }

    #[allow(clippy::expect_used)]
    async fn push(&self, path: &StorePath, value: Value) -> Result<String, RemoteError> {
        let key = {
            let mut inner = self.inner.lock().expect("Mutex poisoned");
            let key = format!("k{:016x}", inner.next_key);
            inner.next_key += 1;
            key
        };
        let child = path.child(&key).map_err(|e| RemoteError::Denied(e.to_string()))?;
        self.write(&child, value)?;
        Ok(key)
    }

    async fn remove(&self, path: &StorePath) -> Result<(), RemoteError> {
        self.write(path, Value::Null)
    }

    async fn query_equal(
        &self,
        path: &StorePath,
        child: &str,
        value: &Value,
    ) -> Result<Vec<(String, Value)>, RemoteError> {
        let Some(Value::Object(children)) = self.read(path)? else {
            return Ok(Vec::new());
        };

        let mut matches: Vec<(String, Value)> = children
            .into_iter()
            .filter(|(_, entry)| entry.get(child) == Some(value))
            .collect();
        matches.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(matches)
    }

    #[allow(clippy::expect_used)]
    fn subscribe(&self, path: &StorePath) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.inner.lock().expect("Mutex poisoned");

        if inner.offline {
            let _ = tx.send(Err(RemoteError::Unavailable("offline".to_string())));
            return Subscription::new(rx);
        }

        let _ = tx.send(Ok(lookup(&inner.root, path).cloned()));
        inner.watchers.push((path.clone(), tx));
        Subscription::new(rx)
    }
}

fn lookup<'a>(root: &'a Map<String, Value>, path: &StorePath) -> Option<&'a Value> {
    let mut segments = path.segments();
    let first = segments.next()?;
    let mut node = root.get(first)?;
    for segment in segments {
        node = node.as_object()?.get(segment)?;
    }
    Some(node)
}

/// Write `value` at `path`, creating intermediate objects. `null` deletes
/// and prunes parents left empty.
fn assign(root: &mut Map<String, Value>, path: &StorePath, value: Value) {
    let segments: Vec<&str> = path.segments().collect();
    assign_at(root, &segments, value);
}

fn assign_at(node: &mut Map<String, Value>, segments: &[&str], value: Value) {
    let Some((head, rest)) = segments.split_first() else {
        return;
    };

    if rest.is_empty() {
        if value.is_null() {
            node.remove(*head);
        } else {
            node.insert((*head).to_string(), value);
        }
        return;
    }

    let emptied = if value.is_null() {
        match node.get_mut(*head) {
            Some(Value::Object(child)) => {
                assign_at(child, rest, value);
                child.is_empty()
            },
            _ => false,
        }
    } else {
        let entry = node.entry((*head).to_string()).or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        if let Value::Object(child) = entry {
            assign_at(child, rest, value);
        }
        false
    };

    if emptied {
        node.remove(*head);
    }
}
