//! Chaotic remote store wrapper for fault injection testing.
//!
//! Randomly fails requests to check that the workflow surfaces network
//! failures instead of hanging or corrupting state.

#![allow(clippy::disallowed_types, reason = "Locking simple RNG state")]

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use rakhwala_proto::StorePath;
use serde_json::Value;
use tokio::sync::mpsc;

use super::{RemoteError, RemoteStore, Snapshot, Subscription};

/// Remote store wrapper that randomly injects [`RemoteError::Unavailable`].
///
/// Delegates to an inner store. A failed request never reaches the inner
/// store, so a failed write leaves no trace.
pub struct ChaoticRemoteStore<R: RemoteStore> {
    inner: R,
    /// Failure rate (0.0 = never fail, 1.0 = always fail)
    failure_rate: f64,
    rng: Mutex<ChaoticRng>,
    operation_count: AtomicUsize,
    failure_count: AtomicUsize,
}

/// Linear congruential generator; reproducible for a given seed.
struct ChaoticRng {
    state: u64,
}

impl ChaoticRng {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Next value in [0.0, 1.0)
    fn next(&mut self) -> f64 {
        // Numerical Recipes constants
        const A: u64 = 1_664_525;
        const C: u64 = 1_013_904_223;
        const M: u64 = 1u64 << 32;

        self.state = (A.wrapping_mul(self.state).wrapping_add(C)) % M;
        (self.state as f64) / (M as f64)
    }
}

impl<R: RemoteStore> ChaoticRemoteStore<R> {
    /// Wrap `inner` with a fixed default seed.
    ///
    /// # Panics
    ///
    /// Panics if `failure_rate` is not in [0.0, 1.0]
    pub fn new(inner: R, failure_rate: f64) -> Self {
        Self::with_seed(inner, failure_rate, 0x5A5A_0F0F_1234_5678)
    }

    /// Wrap `inner` with an explicit seed for reproducible chaos.
    ///
    /// # Panics
    ///
    /// Panics if `failure_rate` is not in [0.0, 1.0]
    pub fn with_seed(inner: R, failure_rate: f64, seed: u64) -> Self {
        assert!(
            (0.0..=1.0).contains(&failure_rate),
            "failure_rate must be between 0.0 and 1.0, got {failure_rate}"
        );

        Self {
            inner,
            failure_rate,
            rng: Mutex::new(ChaoticRng::new(seed)),
            operation_count: AtomicUsize::new(0),
            failure_count: AtomicUsize::new(0),
        }
    }

    /// Wrapped store, for checking state after chaos.
    pub fn inner(&self) -> &R {
        &self.inner
    }

    /// Requests attempted, including failed ones.
    pub fn operation_count(&self) -> usize {
        self.operation_count.load(Ordering::Relaxed)
    }

    /// Requests that were failed on purpose.
    pub fn failure_count(&self) -> usize {
        self.failure_count.load(Ordering::Relaxed)
    }

    fn check(&self) -> Result<(), RemoteError> {
        self.operation_count.fetch_add(1, Ordering::Relaxed);

        #[allow(clippy::expect_used)]
        let fail = self.rng.lock().expect("ChaoticRng mutex poisoned").next() < self.failure_rate;
        if fail {
            self.failure_count.fetch_add(1, Ordering::Relaxed);
            return Err(RemoteError::Unavailable("chaotic failure injection".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl<R: RemoteStore> RemoteStore for ChaoticRemoteStore<R> {
    async fn get(&self, path: &StorePath) -> Result<Snapshot, RemoteError> {
        self.check()?;
        self.inner.get(path).await
    }

    async fn set(&self, path: &StorePath, value: Value) -> Result<(), RemoteError> {
        self.check()?;
        self.inner.set(path, value).await
    }

    async fn push(&self, path: &StorePath, value: Value) -> Result<String, RemoteError> {
        self.check()?;
        self.inner.push(path, value).await
    }

    async fn remove(&self, path: &StorePath) -> Result<(), RemoteError> {
        self.check()?;
        self.inner.remove(path).await
    }

    async fn query_equal(
        &self,
        path: &StorePath,
        child: &str,
        value: &Value,
    ) -> Result<Vec<(String, Value)>, RemoteError> {
        self.check()?;
        self.inner.query_equal(path, child, value).await
    }

    fn subscribe(&self, path: &StorePath) -> Subscription {
        if let Err(err) = self.check() {
            let (tx, rx) = mpsc::unbounded_channel();
            let _ = tx.send(Err(err));
            return Subscription::new(rx);
        }
        self.inner.subscribe(path)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::remote::MemoryRemoteStore;

    fn path() -> StorePath {
        StorePath::parse("locations/123456").unwrap()
    }

    #[tokio::test]
    async fn zero_rate_never_fails() {
        let chaotic = ChaoticRemoteStore::new(MemoryRemoteStore::new(), 0.0);
        for i in 0..100 {
            chaotic.set(&path(), json!(i)).await.expect("should not fail with 0% rate");
        }
        assert_eq!(chaotic.inner().peek(&path()), Some(json!(99)));
        assert_eq!(chaotic.failure_count(), 0);
    }

    #[tokio::test]
    async fn full_rate_always_fails() {
        let chaotic = ChaoticRemoteStore::new(MemoryRemoteStore::new(), 1.0);

        assert!(chaotic.set(&path(), json!(1)).await.is_err());
        assert!(chaotic.get(&path()).await.is_err());
        assert_eq!(chaotic.inner().peek(&path()), None);

        let mut sub = chaotic.subscribe(&path());
        assert!(matches!(sub.next().await, Some(Err(RemoteError::Unavailable(_)))));
        assert_eq!(chaotic.operation_count(), 3);
    }

    #[tokio::test]
    async fn same_seed_same_failures() {
        let a = ChaoticRemoteStore::with_seed(MemoryRemoteStore::new(), 0.5, 42);
        let b = ChaoticRemoteStore::with_seed(MemoryRemoteStore::new(), 0.5, 42);

        for i in 0..100 {
            let ra = a.set(&path(), json!(i)).await;
            let rb = b.set(&path(), json!(i)).await;
            assert_eq!(ra.is_ok(), rb.is_ok(), "determinism violated at iteration {i}");
        }
    }

    #[test]
    #[should_panic(expected = "failure_rate must be between 0.0 and 1.0")]
    fn rejects_invalid_rate() {
        let _chaotic = ChaoticRemoteStore::new(MemoryRemoteStore::new(), 1.5);
    }
}
