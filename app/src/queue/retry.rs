// order-relay/src/queue/retry.rs

use crate::errors::{AppError, Result};
use std::time::Duration;

/// Exponential backoff schedule shared by the queue (timing) and the consumer
/// (when to stop retrying and escalate).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
  pub max_attempts: u32,
  pub min_backoff: Duration,
  pub max_backoff: Duration,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self {
      max_attempts: 3,
      min_backoff: Duration::from_secs(15),
      max_backoff: Duration::from_secs(60),
    }
  }
}

impl RetryPolicy {
  pub fn validate(&self) -> Result<()> {
    if self.max_attempts == 0 {
      return Err(AppError::Config("retry max attempts must be at least 1".to_string()));
    }
    if self.min_backoff > self.max_backoff {
      return Err(AppError::Config(format!(
        "retry min backoff {:?} exceeds max backoff {:?}",
        self.min_backoff, self.max_backoff
      )));
    }
    Ok(())
  }

  /// Delay before redelivering a message whose delivery number `attempt` failed.
  pub fn backoff_for(&self, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(16);
    self
      .min_backoff
      .checked_mul(1u32 << exponent)
      .map_or(self.max_backoff, |d| d.min(self.max_backoff))
  }

  /// `true` once delivery number `attempt` was the last one allowed.
  pub fn is_exhausted(&self, attempt: u32) -> bool {
    attempt >= self.max_attempts
  }
}
