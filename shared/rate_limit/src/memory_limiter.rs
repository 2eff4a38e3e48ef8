//! In-memory rate limiter implementation using sliding window

use crate::limiter::{RateLimitError, RateLimitResult, RateLimiter};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::RwLock;

/// Entry for tracking rate limit data
#[derive(Debug, Clone)]
struct RateLimitEntry {
    /// Timestamps of requests within the window
    timestamps: Vec<u64>,
}

impl RateLimitEntry {
    fn new() -> Self {
        Self {
            timestamps: Vec::new(),
        }
    }

    /// Clean up old timestamps outside the window
    fn cleanup(&mut self, window_start: u64) {
        self.timestamps.retain(|&ts| ts >= window_start);
    }
}

/// In-memory rate limiter using the sliding window log algorithm.
///
/// Counters live independently of the main store and are mutated under a
/// short write-lock critical section, so checks stay atomic under
/// concurrent access.
#[derive(Debug)]
pub struct InMemoryRateLimiter {
    store: Arc<RwLock<HashMap<String, RateLimitEntry>>>,
    max_entries: usize,
}

impl InMemoryRateLimiter {
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(HashMap::new())),
            max_entries: 10_000,
        }
    }

    fn now_secs() -> u64 {
        SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }

    /// Evict idle entries once the map grows past `max_entries`.
    async fn evict_if_needed(&self) {
        let mut store = self.store.write().await;
        if store.len() > self.max_entries {
            let cutoff = Self::now_secs().saturating_sub(86_400);
            store.retain(|_, entry| entry.timestamps.iter().any(|&ts| ts >= cutoff));
        }
    }
}

impl Default for InMemoryRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RateLimiter for InMemoryRateLimiter {
    async fn check_rate_limit(
        &self,
        key: &str,
        max_requests: u32,
        window: Duration,
    ) -> Result<RateLimitResult, RateLimitError> {
        let now = Self::now_secs();
        let window_secs = window.as_secs();
        let window_start = now.saturating_sub(window_secs);

        let mut store = self.store.write().await;

        let entry = store
            .entry(key.to_string())
            .or_insert_with(RateLimitEntry::new);

        entry.cleanup(window_start);

        let current_count = entry.timestamps.len() as u32;

        if current_count >= max_requests {
            // The slot frees up when the oldest recorded hit leaves the window.
            let oldest = entry.timestamps.first().copied().unwrap_or(now);
            let retry_after = (oldest + window_secs).saturating_sub(now).max(1);
            Ok(RateLimitResult::denied(max_requests, retry_after))
        } else {
            entry.timestamps.push(now);
            let remaining = max_requests.saturating_sub(current_count + 1);
            drop(store);
            self.evict_if_needed().await;
            Ok(RateLimitResult::allowed(max_requests, remaining))
        }
    }

    async fn reset(&self, key: &str) -> Result<(), RateLimitError> {
        let mut store = self.store.write().await;
        store.remove(key);
        Ok(())
    }

    async fn get_count(&self, key: &str) -> Result<u32, RateLimitError> {
        let now = Self::now_secs();
        let store = self.store.read().await;

        match store.get(key) {
            Some(entry) => {
                let window_start = now.saturating_sub(3600);
                let count = entry
                    .timestamps
                    .iter()
                    .filter(|&&ts| ts >= window_start)
                    .count();
                Ok(count as u32)
            },
            None => Ok(0),
        }
    }
}

impl Clone for InMemoryRateLimiter {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            max_entries: self.max_entries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_basic_rate_limiting() {
        let limiter = InMemoryRateLimiter::new();
        let key = "test:user:1";
        let window = Duration::from_secs(60);

        for i in 0..3 {
            let result = limiter.check_rate_limit(key, 3, window).await.unwrap();
            assert!(result.allowed, "Request {} should be allowed", i + 1);
            assert_eq!(result.remaining, 2 - i);
        }

        let result = limiter.check_rate_limit(key, 3, window).await.unwrap();
        assert!(!result.allowed, "4th request should be denied");
        assert_eq!(result.remaining, 0);
        assert!(result.retry_after >= 1);
        assert!(result.retry_after <= 60);
    }

    #[tokio::test]
    async fn test_reset() {
        let limiter = InMemoryRateLimiter::new();
        let key = "test:reset";
        let window = Duration::from_secs(60);

        for _ in 0..3 {
            limiter.check_rate_limit(key, 3, window).await.unwrap();
        }

        let result = limiter.check_rate_limit(key, 3, window).await.unwrap();
        assert!(!result.allowed);

        limiter.reset(key).await.unwrap();

        let result = limiter.check_rate_limit(key, 3, window).await.unwrap();
        assert!(result.allowed);
    }

    #[tokio::test]
    async fn test_different_keys_independent() {
        let limiter = InMemoryRateLimiter::new();
        let window = Duration::from_secs(60);

        for _ in 0..3 {
            limiter.check_rate_limit("key1", 3, window).await.unwrap();
        }

        let result = limiter.check_rate_limit("key2", 3, window).await.unwrap();
        assert!(result.allowed);
    }

    #[tokio::test]
    async fn test_get_count() {
        let limiter = InMemoryRateLimiter::new();
        let key = "test:count";
        let window = Duration::from_secs(60);

        assert_eq!(limiter.get_count(key).await.unwrap(), 0);

        limiter.check_rate_limit(key, 10, window).await.unwrap();
        assert_eq!(limiter.get_count(key).await.unwrap(), 1);

        limiter.check_rate_limit(key, 10, window).await.unwrap();
        assert_eq!(limiter.get_count(key).await.unwrap(), 2);
    }
}
