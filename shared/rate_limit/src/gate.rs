//! Category-keyed rate gate with per-endpoint-class limits

use crate::limiter::{RateLimitError, RateLimitResult, RateLimiter};
use crate::memory_limiter::InMemoryRateLimiter;
use std::collections::HashMap;
use std::time::Duration;

/// Endpoint classes subject to throttling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateCategory {
    Login,
    PasswordResetRequest,
    PasswordResetConfirm,
    Refresh,
    VacationWrite,
    VacationRead,
    Export,
    ApiDefault,
}

impl RateCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RateCategory::Login => "login",
            RateCategory::PasswordResetRequest => "password-reset-request",
            RateCategory::PasswordResetConfirm => "password-reset-confirm",
            RateCategory::Refresh => "refresh",
            RateCategory::VacationWrite => "vacation-write",
            RateCategory::VacationRead => "vacation-read",
            RateCategory::Export => "export",
            RateCategory::ApiDefault => "api-default",
        }
    }

    fn from_str(s: &str) -> Option<Self> {
        match s {
            "login" => Some(RateCategory::Login),
            "password-reset-request" => Some(RateCategory::PasswordResetRequest),
            "password-reset-confirm" => Some(RateCategory::PasswordResetConfirm),
            "refresh" => Some(RateCategory::Refresh),
            "vacation-write" => Some(RateCategory::VacationWrite),
            "vacation-read" => Some(RateCategory::VacationRead),
            "export" => Some(RateCategory::Export),
            "api-default" => Some(RateCategory::ApiDefault),
            _ => None,
        }
    }

    /// Default (limit, window) per category.
    fn default_rule(&self) -> (u32, Duration) {
        match self {
            RateCategory::Login => (5, Duration::from_secs(60)),
            RateCategory::PasswordResetRequest => (3, Duration::from_secs(3600)),
            RateCategory::PasswordResetConfirm => (10, Duration::from_secs(3600)),
            RateCategory::Refresh => (30, Duration::from_secs(60)),
            RateCategory::VacationWrite => (60, Duration::from_secs(3600)),
            RateCategory::VacationRead => (200, Duration::from_secs(3600)),
            RateCategory::Export => (10, Duration::from_secs(86_400)),
            RateCategory::ApiDefault => (1000, Duration::from_secs(3600)),
        }
    }
}

/// Sliding-window counters keyed by (endpoint class, principal key).
#[derive(Clone)]
pub struct RateGate {
    limiter: InMemoryRateLimiter,
    rules: HashMap<RateCategory, (u32, Duration)>,
}

impl RateGate {
    pub fn new() -> Self {
        Self {
            limiter: InMemoryRateLimiter::new(),
            rules: HashMap::new(),
        }
    }

    /// Apply overrides in "category=limit/window_secs" comma-separated form.
    /// Unknown categories and unparsable pairs are ignored with a warning.
    pub fn with_overrides(overrides: &str) -> Self {
        let mut gate = Self::new();
        for pair in overrides.split(',').filter(|s| !s.trim().is_empty()) {
            match Self::parse_override(pair.trim()) {
                Some((category, limit, window)) => {
                    gate.rules.insert(category, (limit, window));
                },
                None => {
                    tracing::warn!(pair = %pair, "Ignoring unparsable rate-limit override");
                },
            }
        }
        gate
    }

    fn parse_override(pair: &str) -> Option<(RateCategory, u32, Duration)> {
        let (name, rule) = pair.split_once('=')?;
        let (limit, window) = rule.split_once('/')?;
        let category = RateCategory::from_str(name.trim())?;
        let limit: u32 = limit.trim().parse().ok()?;
        let window: u64 = window.trim().parse().ok()?;
        Some((category, limit, Duration::from_secs(window)))
    }

    fn rule(&self, category: RateCategory) -> (u32, Duration) {
        self.rules
            .get(&category)
            .copied()
            .unwrap_or_else(|| category.default_rule())
    }

    /// Atomically check and record one hit for (category, key).
    pub async fn check_and_record(
        &self,
        category: RateCategory,
        key: &str,
    ) -> Result<RateLimitResult, RateLimitError> {
        let (limit, window) = self.rule(category);
        let scoped_key = format!("{}:{}", category.as_str(), key);
        self.limiter.check_rate_limit(&scoped_key, limit, window).await
    }

    /// Clear the counter for (category, key).
    pub async fn reset(&self, category: RateCategory, key: &str) -> Result<(), RateLimitError> {
        let scoped_key = format!("{}:{}", category.as_str(), key);
        self.limiter.reset(&scoped_key).await
    }
}

impl Default for RateGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn login_category_caps_at_five_per_minute() {
        let gate = RateGate::new();
        for _ in 0..5 {
            let result = gate
                .check_and_record(RateCategory::Login, "ip:email")
                .await
                .unwrap();
            assert!(result.allowed);
        }
        let result = gate
            .check_and_record(RateCategory::Login, "ip:email")
            .await
            .unwrap();
        assert!(!result.allowed);
        assert!(result.retry_after >= 1);
    }

    #[tokio::test]
    async fn categories_are_isolated() {
        let gate = RateGate::new();
        for _ in 0..5 {
            gate.check_and_record(RateCategory::Login, "k").await.unwrap();
        }
        assert!(!gate
            .check_and_record(RateCategory::Login, "k")
            .await
            .unwrap()
            .allowed);
        // Same key, different category: unaffected.
        assert!(gate
            .check_and_record(RateCategory::Refresh, "k")
            .await
            .unwrap()
            .allowed);
    }

    #[tokio::test]
    async fn overrides_replace_defaults() {
        let gate = RateGate::with_overrides("login=2/60, export=1/10");
        assert_eq!(gate.rule(RateCategory::Login), (2, Duration::from_secs(60)));
        assert_eq!(gate.rule(RateCategory::Export), (1, Duration::from_secs(10)));
        // Untouched categories keep their defaults.
        assert_eq!(
            gate.rule(RateCategory::VacationRead),
            (200, Duration::from_secs(3600))
        );
    }

    #[test]
    fn bad_overrides_are_ignored() {
        let gate = RateGate::with_overrides("nonsense, login=abc/60, unknown=1/2");
        assert_eq!(gate.rule(RateCategory::Login), (5, Duration::from_secs(60)));
    }
}
