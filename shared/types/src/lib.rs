// Common types used across crates
pub use chrono::{DateTime, Utc};
pub use uuid::Uuid;

use std::sync::Arc;

/// Wall-clock abstraction so time-dependent logic is testable.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system time.
#[derive(Debug, Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Fixed clock for tests; advances only when told to.
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Arc<std::sync::Mutex<DateTime<Utc>>>,
}

impl FixedClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(std::sync::Mutex::new(now)),
        }
    }

    pub fn advance(&self, duration: chrono::Duration) {
        let mut guard = self.now.lock().expect("clock mutex poisoned");
        *guard += duration;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock mutex poisoned")
    }
}

pub type SharedClock = Arc<dyn Clock>;

/// Company (tenant) context for multi-tenancy
#[derive(Debug, Clone)]
pub struct CompanyContext {
    pub company_id: Uuid,
}

/// Pagination envelope shared by list endpoints.
#[derive(Debug, Clone, Copy, serde::Deserialize)]
pub struct PageParams {
    #[serde(default = "default_page")]
    pub page: i32,
    #[serde(default = "default_page_size")]
    pub page_size: i32,
}

fn default_page() -> i32 {
    1
}

fn default_page_size() -> i32 {
    20
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 20,
        }
    }
}

impl PageParams {
    /// Clamp to safe bounds and translate to a row offset.
    pub fn clamped(self) -> (i32, i32, i64) {
        let page = self.page.max(1);
        let page_size = self.page_size.clamp(1, 100);
        let offset = ((page as i64) - 1) * (page_size as i64);
        (page, page_size, offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn fixed_clock_advances() {
        let t0 = Utc.with_ymd_and_hms(2025, 1, 6, 9, 0, 0).unwrap();
        let clock = FixedClock::at(t0);
        assert_eq!(clock.now(), t0);
        clock.advance(chrono::Duration::seconds(60));
        assert_eq!(clock.now(), t0 + chrono::Duration::seconds(60));
    }

    #[test]
    fn page_params_clamp() {
        let (page, size, offset) = PageParams {
            page: 0,
            page_size: 1000,
        }
        .clamped();
        assert_eq!((page, size, offset), (1, 100, 0));

        let (_, _, offset) = PageParams {
            page: 3,
            page_size: 20,
        }
        .clamped();
        assert_eq!(offset, 40);
    }
}
