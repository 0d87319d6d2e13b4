use std::thread;
use std::time::Duration;

use log::warn;

use crate::error::Result;

/// Bounded retry with exponential backoff for the network boundaries.
///
/// Only errors for which `Error::is_transient` is true are retried.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first. Zero behaves like one.
    pub attempts: u32,

    /// Delay before the second attempt; doubled before each further attempt.
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt.
    pub fn none() -> RetryPolicy {
        RetryPolicy {
            attempts: 1,
            base_delay: Duration::from_millis(0),
        }
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        self.base_delay * (1u32 << shift)
    }

    /// Run `f` until it succeeds, fails permanently, or attempts run out.
    pub fn run<T>(&self, label: &str, mut f: impl FnMut() -> Result<T>) -> Result<T> {
        let attempts = self.attempts.max(1);
        let mut attempt = 1;

        loop {
            match f() {
                Ok(v) => return Ok(v),
                Err(err) if attempt < attempts && err.is_transient() => {
                    let delay = self.delay(attempt);
                    warn!(
                        "{} failed (attempt {} of {}): {}; retrying in {:?}",
                        label, attempt, attempts, err, delay
                    );
                    thread::sleep(delay);
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            attempts: 3,
            base_delay: Duration::from_millis(200),
        }
    }
}
