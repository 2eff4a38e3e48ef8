//! Account lockout latch for repeated failed login attempts

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Consecutive failures within the window before the latch sets.
const LOCKOUT_THRESHOLD: u32 = 5;
/// Window in which failures are counted as consecutive.
const FAILURE_WINDOW: Duration = Duration::from_secs(900);
/// How long the latch holds once set.
const LOCKOUT_DURATION: Duration = Duration::from_secs(900);

#[derive(Debug, Clone)]
pub struct LockoutStatus {
    /// Whether the account is currently locked
    pub is_locked: bool,
    /// Number of failed attempts counted
    pub failed_attempts: u32,
    /// Remaining lockout time in seconds (if locked)
    pub remaining_seconds: Option<u64>,
}

impl LockoutStatus {
    fn unlocked(failed_attempts: u32) -> Self {
        Self {
            is_locked: false,
            failed_attempts,
            remaining_seconds: None,
        }
    }

    fn locked(failed_attempts: u32, remaining: Duration) -> Self {
        // Round up so a just-set latch reports its full duration.
        let secs = remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);
        Self {
            is_locked: true,
            failed_attempts,
            remaining_seconds: Some(secs.max(1)),
        }
    }
}

#[derive(Debug)]
struct LockoutEntry {
    failure_times: Vec<Instant>,
    locked_until: Option<Instant>,
}

/// Lockout latch keyed by email.
///
/// After `LOCKOUT_THRESHOLD` consecutive failed verifications within
/// `FAILURE_WINDOW`, the latch is set and login answers LoginLocked for
/// `LOCKOUT_DURATION` regardless of credential validity. The latch clears on
/// expiry, on a successful password reset, or by admin unlock.
#[derive(Clone)]
pub struct LoginLockout {
    entries: Arc<Mutex<HashMap<String, LockoutEntry>>>,
    threshold: u32,
    failure_window: Duration,
    lockout_duration: Duration,
}

impl LoginLockout {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            threshold: LOCKOUT_THRESHOLD,
            failure_window: FAILURE_WINDOW,
            lockout_duration: LOCKOUT_DURATION,
        }
    }

    /// Shorter windows for tests.
    pub fn with_policy(threshold: u32, failure_window: Duration, lockout_duration: Duration) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            threshold,
            failure_window,
            lockout_duration,
        }
    }

    fn key(email: &str) -> String {
        email.to_lowercase()
    }

    /// Check the latch without recording anything.
    pub async fn check(&self, email: &str) -> LockoutStatus {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();

        match entries.get_mut(&Self::key(email)) {
            Some(entry) => {
                if let Some(until) = entry.locked_until {
                    if until > now {
                        return LockoutStatus::locked(self.threshold, until - now);
                    }
                    // Latch expired; start over.
                    entry.locked_until = None;
                    entry.failure_times.clear();
                }
                let cutoff = now.checked_sub(self.failure_window);
                entry
                    .failure_times
                    .retain(|&t| cutoff.map(|c| t >= c).unwrap_or(true));
                LockoutStatus::unlocked(entry.failure_times.len() as u32)
            },
            None => LockoutStatus::unlocked(0),
        }
    }

    /// Record a failed verification; sets the latch on the threshold-th
    /// consecutive failure.
    pub async fn record_failure(&self, email: &str) -> LockoutStatus {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();

        let entry = entries.entry(Self::key(email)).or_insert(LockoutEntry {
            failure_times: Vec::new(),
            locked_until: None,
        });

        if let Some(until) = entry.locked_until {
            if until > now {
                return LockoutStatus::locked(self.threshold, until - now);
            }
            entry.locked_until = None;
            entry.failure_times.clear();
        }

        let cutoff = now.checked_sub(self.failure_window);
        entry
            .failure_times
            .retain(|&t| cutoff.map(|c| t >= c).unwrap_or(true));
        entry.failure_times.push(now);

        let failed = entry.failure_times.len() as u32;
        if failed >= self.threshold {
            entry.locked_until = Some(now + self.lockout_duration);
            info!(failed_attempts = failed, "Login lockout latch set");
            return LockoutStatus::locked(failed, self.lockout_duration);
        }

        warn!(failed_attempts = failed, "Failed login attempt recorded");
        LockoutStatus::unlocked(failed)
    }

    /// Clear both the counter and the latch (successful login, password
    /// reset, or admin unlock).
    pub async fn clear(&self, email: &str) {
        let mut entries = self.entries.lock().await;
        entries.remove(&Self::key(email));
    }
}

impl Default for LoginLockout {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn latch_sets_on_fifth_failure() {
        let lockout = LoginLockout::new();
        let email = "mallory@co.example";

        for i in 1..=4 {
            let status = lockout.record_failure(email).await;
            assert!(!status.is_locked, "attempt {} should not lock", i);
            assert_eq!(status.failed_attempts, i);
        }

        let status = lockout.record_failure(email).await;
        assert!(status.is_locked);
        assert_eq!(status.remaining_seconds, Some(900));

        // Sixth attempt observes the latch, not the credential outcome.
        let status = lockout.check(email).await;
        assert!(status.is_locked);
    }

    #[tokio::test]
    async fn emails_are_case_insensitive() {
        let lockout = LoginLockout::new();
        for _ in 0..5 {
            lockout.record_failure("Mallory@CO.example").await;
        }
        assert!(lockout.check("mallory@co.example").await.is_locked);
    }

    #[tokio::test]
    async fn clear_releases_the_latch() {
        let lockout = LoginLockout::new();
        let email = "user@co.example";
        for _ in 0..5 {
            lockout.record_failure(email).await;
        }
        assert!(lockout.check(email).await.is_locked);

        lockout.clear(email).await;
        let status = lockout.check(email).await;
        assert!(!status.is_locked);
        assert_eq!(status.failed_attempts, 0);
    }

    #[tokio::test]
    async fn latch_expires() {
        let lockout = LoginLockout::with_policy(
            2,
            Duration::from_millis(50),
            Duration::from_millis(50),
        );
        let email = "brief@co.example";
        lockout.record_failure(email).await;
        let status = lockout.record_failure(email).await;
        assert!(status.is_locked);

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(!lockout.check(email).await.is_locked);
    }
}
