//! Background cleanup ticker.
//!
//! Expires old refresh tokens on an interval. Idempotent with the on-read
//! expiry checks; the system stays correct if this never runs.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use vacation_service_core::domains::auth::domain::repository::SessionRepository;

const CLEANUP_INTERVAL: Duration = Duration::from_secs(3600);

pub fn spawn_cleanup_ticker(session_repo: Arc<dyn SessionRepository>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            match session_repo.delete_expired(Utc::now()).await {
                Ok(0) => {},
                Ok(removed) => {
                    tracing::info!(removed = %removed, "Expired refresh tokens cleaned up");
                },
                Err(e) => {
                    tracing::warn!("Refresh token cleanup failed: {}", e);
                },
            }
        }
    });
}
