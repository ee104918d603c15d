//! Bounded retry for writes that hit a busy database
//!
//! SQLite answers `SQLITE_BUSY` / `SQLITE_LOCKED` when another connection
//! holds the write lock. Those writes are retried with exponential backoff;
//! once the attempts are used up the caller gets [`StoreError::Conflict`].
//! A write is never dropped silently.

use std::future::Future;
use std::time::Duration;

use asnmap_common::types::EntityKind;
use tokio::time::sleep;
use tracing::{debug, warn};

use super::{StoreError, StoreResult};

/// Retry policy for store writes
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::for_writes(5)
    }
}

impl RetryConfig {
    pub fn for_writes(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay: Duration::from_millis(25),
            max_delay: Duration::from_secs(2),
            backoff_multiplier: 2.0,
        }
    }

    /// Delay before retry number `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self.backoff_multiplier.powi(attempt.saturating_sub(1) as i32);
        let millis = (self.initial_delay.as_millis() as f64 * factor) as u64;
        Duration::from_millis(millis).min(self.max_delay)
    }
}

/// SQLite result codes that mean "someone else holds the lock, try again".
const BUSY_CODES: &[&str] = &["5", "6", "261", "262", "517"];

pub fn is_retryable(err: &StoreError) -> bool {
    match err {
        StoreError::Database(sqlx::Error::Database(db)) => {
            let code_busy = db.code().map(|c| BUSY_CODES.contains(&&*c)).unwrap_or(false);
            let message = db.message().to_ascii_lowercase();
            code_busy || message.contains("database is locked") || message.contains("busy")
        },
        StoreError::Database(sqlx::Error::PoolTimedOut) => true,
        _ => false,
    }
}

/// Run `operation` until it succeeds, fails permanently, or runs out of attempts.
pub async fn with_retry<T, F, Fut>(
    config: &RetryConfig,
    kind: EntityKind,
    key: &str,
    mut operation: F,
) -> StoreResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = StoreResult<T>>,
{
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(%kind, key, attempt, "Store write succeeded after retry");
                }
                return Ok(value);
            },
            Err(err) if is_retryable(&err) => {
                if attempt >= config.max_attempts {
                    warn!(%kind, key, attempts = attempt, error = %err, "Store write gave up");
                    return Err(StoreError::Conflict {
                        kind,
                        key: key.to_string(),
                        attempts: attempt,
                    });
                }
                let delay = config.delay_for(attempt);
                warn!(%kind, key, attempt, ?delay, error = %err, "Store busy, retrying write");
                sleep(delay).await;
                attempt += 1;
            },
            Err(err) => return Err(err),
        }
    }
}
