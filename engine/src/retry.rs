use std::{fmt::Display, time::Duration};

use log::{error, info};
use thiserror::Error;
use tokio::time::sleep;

use crate::MAX_RETRIES;

/// Tells the retry loop whether another attempt could succeed.
pub trait Retriable {
    fn is_retriable(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    /// Wait after the failed attempt with 0-based index `attempt`: `base * 2^attempt`.
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

#[derive(Debug, Error)]
pub enum RetryError<E> {
    #[error("Error processing image after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: E },

    #[error("Error processing image: {0}")]
    Aborted(E),
}

/// Runs `op` until it succeeds, fails with a non-retriable error, or
/// `policy.max_retries` attempts were made. The attempt index is passed to `op`.
pub async fn retry<T, E>(
    policy: &RetryPolicy,
    mut op: impl AsyncFnMut(u32) -> Result<T, E>,
) -> Result<T, RetryError<E>>
where
    E: Retriable + Display,
{
    let max = policy.max_retries.max(1);
    let mut attempt = 0;
    loop {
        info!("Attempt {}/{max} to process image", attempt + 1);
        let err = match op(attempt).await {
            Ok(res) => return Ok(res),
            Err(e) => e,
        };

        error!("Attempt {}/{max} failed: {err}", attempt + 1);
        if !err.is_retriable() {
            return Err(RetryError::Aborted(err));
        }
        if attempt + 1 >= max {
            return Err(RetryError::Exhausted {
                attempts: max,
                last: err,
            });
        }

        let wait = policy.delay(attempt);
        info!("Waiting {} seconds before retry...", wait.as_secs_f64());
        sleep(wait).await;
        attempt += 1;
    }
}
