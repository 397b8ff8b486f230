//! Deterministic Environment for simulation.
//!
//! `SimEnv` reads time from tokio's clock, so a test started with
//! `#[tokio::test(start_paused = true)]` sees virtual time that only advances
//! when every task is idle. Randomness comes from a seeded `ChaCha8` stream:
//! the same seed produces the same access codes on every run.

#![allow(clippy::disallowed_types, reason = "Synchronous locking operations only")]

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use rakhwala_core::Environment;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Seeded environment on tokio's (pausable) clock.
#[derive(Clone)]
pub struct SimEnv {
    rng: Arc<Mutex<ChaCha8Rng>>,
}

impl SimEnv {
    /// Create an environment with a fixed seed.
    pub fn with_seed(seed: u64) -> Self {
        Self { rng: Arc::new(Mutex::new(ChaCha8Rng::seed_from_u64(seed))) }
    }
}

impl Default for SimEnv {
    fn default() -> Self {
        Self::with_seed(0)
    }
}

impl Environment for SimEnv {
    type Instant = tokio::time::Instant;

    fn now(&self) -> Self::Instant {
        tokio::time::Instant::now()
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }

    #[allow(clippy::expect_used)]
    fn random_bytes(&self, buffer: &mut [u8]) {
        self.rng.lock().expect("Mutex poisoned").fill_bytes(buffer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_stream() {
        let a = SimEnv::with_seed(7);
        let b = SimEnv::with_seed(7);
        assert_eq!(a.random_u64(), b.random_u64());
        assert_eq!(a.random_below(900_000), b.random_below(900_000));
    }

    #[test]
    fn clones_share_the_stream() {
        let a = SimEnv::with_seed(7);
        let first = a.clone().random_u64();
        let fresh = SimEnv::with_seed(7);
        assert_eq!(fresh.random_u64(), first);
        assert_ne!(a.random_u64(), first);
    }

    #[tokio::test(start_paused = true)]
    async fn sleep_advances_virtual_time() {
        let env = SimEnv::default();
        let start = env.now();
        env.sleep(Duration::from_secs(10)).await;
        assert!(env.now() - start >= Duration::from_secs(10));
    }
}
