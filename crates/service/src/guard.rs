//! Rate limiter / lockout guard.
//!
//! Tracks failed-attempt counters per actor+action key. Each key moves
//! Open -> Locked when the count reaches the threshold inside the window,
//! and back to Open on window expiry or an explicit success. The guard is a
//! boolean gate: checking lock state never fails and never blocks beyond
//! the mutex.

use chommie_core::AppConfig;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy)]
struct Counter {
    count: u32,
    window_expires: Instant,
}

/// Attempt counter with threshold lockout.
///
/// Explicitly constructed and shared via `Arc`; increment-and-check runs
/// under one mutex acquisition, so concurrent failures cannot race past the
/// threshold.
#[derive(Debug)]
pub struct AttemptGuard {
    counters: Mutex<HashMap<String, Counter>>,
    max_attempts: u32,
    window: Duration,
}

impl AttemptGuard {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_limits(config.max_attempts, config.window())
    }

    /// Construct with explicit limits.
    pub fn with_limits(max_attempts: u32, window: Duration) -> Self {
        Self { counters: Mutex::new(HashMap::new()), max_attempts, window }
    }

    /// Whether the key is currently locked. Expired windows read as open
    /// and are dropped on the way.
    pub async fn is_locked(&self, key: &str) -> bool {
        let mut counters = self.counters.lock().await;
        match counters.get(key) {
            Some(counter) if counter.window_expires > Instant::now() => counter.count >= self.max_attempts,
            Some(_) => {
                counters.remove(key);
                false
            }
            None => false,
        }
    }

    /// Record an attempt outcome.
    ///
    /// A failure increments the counter (saturating at the threshold) and
    /// refreshes the window; a success clears the key entirely.
    pub async fn record_attempt(&self, key: &str, success: bool) {
        let mut counters = self.counters.lock().await;
        if success {
            counters.remove(key);
            return;
        }

        let now = Instant::now();
        let counter = counters.entry(key.to_string()).or_insert(Counter { count: 0, window_expires: now });
        if counter.window_expires <= now {
            counter.count = 0;
        }
        counter.count = (counter.count + 1).min(self.max_attempts);
        counter.window_expires = now + self.window;

        if counter.count >= self.max_attempts {
            tracing::warn!("actor locked out: {key} ({} attempts)", counter.count);
        }
    }

    /// Current attempt count for a key, 0 if open or expired.
    pub async fn attempts(&self, key: &str) -> u32 {
        let counters = self.counters.lock().await;
        match counters.get(key) {
            Some(counter) if counter.window_expires > Instant::now() => counter.count,
            _ => 0,
        }
    }

    /// Drop expired counters. Reads already ignore them; this just bounds
    /// the map for long-lived processes.
    pub async fn sweep(&self) -> usize {
        let mut counters = self.counters.lock().await;
        let now = Instant::now();
        let before = counters.len();
        counters.retain(|_, counter| counter.window_expires > now);
        before - counters.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guard(max_attempts: u32, window_ms: u64) -> AttemptGuard {
        AttemptGuard::with_limits(max_attempts, Duration::from_millis(window_ms))
    }

    #[tokio::test]
    async fn test_locks_at_threshold() {
        let guard = guard(5, 60_000);
        for _ in 0..4 {
            guard.record_attempt("login:thandi@example.com", false).await;
            assert!(!guard.is_locked("login:thandi@example.com").await);
        }

        guard.record_attempt("login:thandi@example.com", false).await;
        assert!(guard.is_locked("login:thandi@example.com").await);
    }

    #[tokio::test]
    async fn test_count_saturates() {
        let guard = guard(5, 60_000);
        for _ in 0..20 {
            guard.record_attempt("k", false).await;
        }
        assert_eq!(guard.attempts("k").await, 5);
        assert!(guard.is_locked("k").await);
    }

    #[tokio::test]
    async fn test_success_resets() {
        let guard = guard(5, 60_000);
        for _ in 0..5 {
            guard.record_attempt("k", false).await;
        }
        assert!(guard.is_locked("k").await);

        guard.record_attempt("k", true).await;
        assert!(!guard.is_locked("k").await);
        assert_eq!(guard.attempts("k").await, 0);
    }

    #[tokio::test]
    async fn test_window_expiry_unlocks() {
        let guard = guard(2, 50);
        guard.record_attempt("k", false).await;
        guard.record_attempt("k", false).await;
        assert!(guard.is_locked("k").await);

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(!guard.is_locked("k").await);
        assert_eq!(guard.attempts("k").await, 0);
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let guard = guard(2, 60_000);
        guard.record_attempt("login:a", false).await;
        guard.record_attempt("login:a", false).await;

        assert!(guard.is_locked("login:a").await);
        assert!(!guard.is_locked("login:b").await);
    }

    #[tokio::test]
    async fn test_concurrent_failures_bounded() {
        let guard = std::sync::Arc::new(AttemptGuard::with_limits(5, Duration::from_secs(60)));
        let mut handles = Vec::new();
        for _ in 0..20 {
            let guard = guard.clone();
            handles.push(tokio::spawn(async move {
                guard.record_attempt("k", false).await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(guard.attempts("k").await, 5);
    }

    #[tokio::test]
    async fn test_sweep_drops_expired() {
        let guard = guard(2, 50);
        guard.record_attempt("a", false).await;
        guard.record_attempt("b", false).await;

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(guard.sweep().await, 2);
    }
}
