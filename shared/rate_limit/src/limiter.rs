//! Rate limiter trait and types

use async_trait::async_trait;
use std::time::Duration;

/// Result of a rate limit check
#[derive(Debug, Clone)]
pub struct RateLimitResult {
    /// Whether the request is allowed
    pub allowed: bool,
    /// Maximum number of requests allowed in the window
    pub limit: u32,
    /// Number of requests remaining in the current window
    pub remaining: u32,
    /// Seconds until a denied caller may retry (0 when allowed)
    pub retry_after: u64,
}

impl RateLimitResult {
    pub fn allowed(limit: u32, remaining: u32) -> Self {
        Self {
            allowed: true,
            limit,
            remaining,
            retry_after: 0,
        }
    }

    pub fn denied(limit: u32, retry_after: u64) -> Self {
        Self {
            allowed: false,
            limit,
            remaining: 0,
            retry_after,
        }
    }
}

/// Error types for rate limiting operations
#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Rate limiter trait for different implementations
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Check if a request is allowed and update the counter
    async fn check_rate_limit(
        &self,
        key: &str,
        max_requests: u32,
        window: Duration,
    ) -> Result<RateLimitResult, RateLimitError>;

    /// Reset the rate limit for a specific key
    async fn reset(&self, key: &str) -> Result<(), RateLimitError>;

    /// Get the current count for a key without incrementing
    async fn get_count(&self, key: &str) -> Result<u32, RateLimitError>;
}

/// Key generator for rate limiting
pub struct KeyGenerator;

impl KeyGenerator {
    /// Generate a hashed key for an IP address
    pub fn ip_key(prefix: &str, ip: &str) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(ip.as_bytes());
        let hash = hex::encode(hasher.finalize());
        format!("{}:{}", prefix, &hash[..16])
    }

    /// Generate a hashed key for an email address (case-insensitive)
    pub fn email_key(prefix: &str, email: &str) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(email.to_lowercase().as_bytes());
        let hash = hex::encode(hasher.finalize());
        format!("{}:{}", prefix, &hash[..16])
    }

    /// Generate a combined IP + email key for login throttling
    pub fn ip_email_key(prefix: &str, ip: &str, email: &str) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(ip.as_bytes());
        hasher.update(b"|");
        hasher.update(email.to_lowercase().as_bytes());
        let hash = hex::encode(hasher.finalize());
        format!("{}:{}", prefix, &hash[..16])
    }

    /// Generate a key for a user ID (no hashing needed for UUIDs)
    pub fn user_key(prefix: &str, user_id: &str) -> String {
        format!("{}:{}", prefix, user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_generator_ip() {
        let key1 = KeyGenerator::ip_key("rate_limit:login:ip", "192.168.1.1");
        let key2 = KeyGenerator::ip_key("rate_limit:login:ip", "192.168.1.1");
        let key3 = KeyGenerator::ip_key("rate_limit:login:ip", "192.168.1.2");

        assert_eq!(key1, key2);
        assert_ne!(key1, key3);
        assert!(key1.starts_with("rate_limit:login:ip:"));
    }

    #[test]
    fn test_key_generator_email_case_insensitive() {
        let key1 = KeyGenerator::email_key("rate_limit:reset", "User@Example.COM");
        let key2 = KeyGenerator::email_key("rate_limit:reset", "user@example.com");

        assert_eq!(key1, key2);
    }

    #[test]
    fn test_ip_email_key_binds_both() {
        let a = KeyGenerator::ip_email_key("login", "10.0.0.1", "a@co.example");
        let b = KeyGenerator::ip_email_key("login", "10.0.0.2", "a@co.example");
        let c = KeyGenerator::ip_email_key("login", "10.0.0.1", "b@co.example");

        assert_ne!(a, b);
        assert_ne!(a, c);
    }
}
