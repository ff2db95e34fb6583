//! Bounded retry with multiplicative backoff.
//!
//! Each attempt reports a typed [`Attempt`] outcome; the loop decides from
//! that alone whether to stop, wait, or give up.

use std::{fmt::Display, future::Future, time::Duration};

use tracing::{debug, warn};

/// Ceiling for a single wait, whatever the factor.
pub const MAX_BACKOFF: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_backoff: Duration,
    backoff_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(1_000),
            backoff_factor: 1.5,
        }
    }
}

impl RetryPolicy {
    /// At least one attempt is always made and the backoff never shrinks.
    pub fn new(max_attempts: u32, initial_backoff: Duration, backoff_factor: f64) -> Self {
        let backoff_factor = if backoff_factor.is_finite() {
            backoff_factor.max(1.0)
        } else {
            1.0
        };
        Self {
            max_attempts: max_attempts.max(1),
            initial_backoff,
            backoff_factor,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn initial_backoff(&self) -> Duration {
        self.initial_backoff
    }

    pub fn backoff_factor(&self) -> f64 {
        self.backoff_factor
    }

    /// Grows `current` by the factor, saturating at [`MAX_BACKOFF`].
    pub fn next_backoff(&self, current: Duration) -> Duration {
        Duration::try_from_secs_f64(current.as_secs_f64() * self.backoff_factor)
            .map_or(MAX_BACKOFF, |next| next.min(MAX_BACKOFF))
    }

    /// Waits between consecutive attempts, `max_attempts - 1` of them.
    #[cfg(test)]
    fn schedule(&self) -> Vec<Duration> {
        let mut delays = Vec::with_capacity(self.max_attempts as usize);
        let mut delay = self.initial_backoff;
        for _ in 1..self.max_attempts {
            delays.push(delay);
            delay = self.next_backoff(delay);
        }
        delays
    }
}

/// Outcome of one attempt.
#[derive(Debug)]
pub enum Attempt<T, E> {
    Done(T),
    Retry(E),
    Fail(E),
}

#[derive(Debug, PartialEq)]
pub enum RetryError<E> {
    /// Every attempt failed transiently; `last` is the final failure.
    Exhausted { attempts: u32, last: E },
    /// A non-retryable failure stopped the loop.
    Fatal { attempts: u32, error: E },
}

impl<E> RetryError<E> {
    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::Exhausted { attempts, .. } | RetryError::Fatal { attempts, .. } => *attempts,
        }
    }

    pub fn into_inner(self) -> E {
        match self {
            RetryError::Exhausted { last, .. } => last,
            RetryError::Fatal { error, .. } => error,
        }
    }
}

/// Run `op` until it succeeds, fails fatally, or the policy runs out of attempts.
///
/// `op` receives the 1-based attempt number.
pub async fn run<T, E, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, RetryError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Attempt<T, E>>,
    E: Display,
{
    let mut backoff = policy.initial_backoff;
    let mut attempt = 1;

    loop {
        match op(attempt).await {
            Attempt::Done(value) => {
                if attempt > 1 {
                    debug!(attempt, "succeeded after retry");
                }
                return Ok(value);
            }
            Attempt::Fail(error) => {
                return Err(RetryError::Fatal {
                    attempts: attempt,
                    error,
                });
            }
            Attempt::Retry(error) if attempt >= policy.max_attempts => {
                warn!(attempt, %error, "retry budget exhausted");
                return Err(RetryError::Exhausted {
                    attempts: attempt,
                    last: error,
                });
            }
            Attempt::Retry(error) => {
                warn!(
                    attempt,
                    max_attempts = policy.max_attempts,
                    delay_ms = backoff.as_millis() as u64,
                    %error,
                    "transient failure, backing off"
                );
                tokio::time::sleep(backoff).await;
                backoff = policy.next_backoff(backoff);
                attempt += 1;
            }
        }
    }
}
