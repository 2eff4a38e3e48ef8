//! Shared Rate Limiting Library
//!
//! Sliding-window counters keyed by (endpoint class, principal key), plus the
//! login lockout latch:
//!
//! - per-category limits with environment-driven overrides
//! - atomic check-and-record under concurrent access
//! - account lockout after consecutive failed login attempts
//!
//! # Example
//!
//! ```rust,ignore
//! use shared_rate_limit::{RateCategory, RateGate};
//!
//! let gate = RateGate::with_overrides(&config.rate_limit_overrides);
//! let result = gate.check_and_record(RateCategory::Login, &key).await?;
//! if !result.allowed {
//!     return Err(AppError::RateLimited(result.retry_after));
//! }
//! ```

pub mod gate;
pub mod limiter;
pub mod lockout;
pub mod memory_limiter;

// Re-export main types
pub use gate::{RateCategory, RateGate};
pub use limiter::{KeyGenerator, RateLimitError, RateLimitResult, RateLimiter};
pub use lockout::{LockoutStatus, LoginLockout};
pub use memory_limiter::InMemoryRateLimiter;
