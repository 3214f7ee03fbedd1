//! Retry strategies and predicates for handling connectivity failures.
//!
//! A [`Connector`](crate::Connector) retries a fetch when its
//! [`RetryPredicate`] accepts the error and its [`RetryStrategy`] still has a
//! delay to offer. Delays are spent on the calling thread through a
//! [`Sleeper`].

use crate::Error;
use std::time::Duration;

/// Number of retries the default strategy allows.
pub const DEFAULT_MAX_RETRIES: usize = 10;

/// Backoff step of the default strategy.
pub const DEFAULT_BACKOFF_STEP: Duration = Duration::from_secs(5);

/// Defines how long to wait between attempts, and when to give up.
///
/// # Examples
///
/// ```
/// use scieloapi::RetryStrategy;
/// use std::time::Duration;
///
/// // 0s, 5s, 10s, ... 45s, then give up
/// let linear = RetryStrategy::LinearBackoff {
///     step: Duration::from_secs(5),
///     max_retries: 10,
/// };
/// assert_eq!(linear.delay_for_attempt(1), Some(Duration::ZERO));
/// assert_eq!(linear.delay_for_attempt(3), Some(Duration::from_secs(10)));
/// assert_eq!(linear.delay_for_attempt(11), None);
/// ```
#[derive(Debug, Clone)]
pub enum RetryStrategy {
    /// Do not retry failed requests.
    None,

    /// Retry with linearly increasing delays.
    ///
    /// The n-th retry waits `step * (n - 1)`, so the first retry is immediate.
    LinearBackoff {
        /// The delay added for each consecutive failure.
        step: Duration,
        /// The maximum number of retry attempts.
        max_retries: usize,
    },

    /// Custom retry logic.
    ///
    /// Provide a function that takes the retry number (starting from 1)
    /// and returns `Some(delay)` to retry after the delay, or `None` to stop.
    Custom {
        /// Function that determines retry delay.
        delay_fn: fn(attempt: usize) -> Option<Duration>,
    },
}

impl Default for RetryStrategy {
    fn default() -> Self {
        RetryStrategy::LinearBackoff {
            step: DEFAULT_BACKOFF_STEP,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl RetryStrategy {
    /// Returns the delay before the given retry, or `None` if retries are exhausted.
    ///
    /// # Arguments
    ///
    /// * `attempt` - The retry number (1-indexed, so 1 = first retry)
    pub fn delay_for_attempt(&self, attempt: usize) -> Option<Duration> {
        match self {
            RetryStrategy::None => None,
            RetryStrategy::LinearBackoff { step, max_retries } => {
                if attempt == 0 || attempt > *max_retries {
                    return None;
                }
                let factor = u32::try_from(attempt - 1).unwrap_or(u32::MAX);
                Some(step.saturating_mul(factor))
            }
            RetryStrategy::Custom { delay_fn } => delay_fn(attempt),
        }
    }

    /// Returns the maximum number of retries, if applicable.
    pub fn max_retries(&self) -> Option<usize> {
        match self {
            RetryStrategy::None => Some(0),
            RetryStrategy::LinearBackoff { max_retries, .. } => Some(*max_retries),
            RetryStrategy::Custom { .. } => None,
        }
    }
}

/// Trait for determining whether a failed request should be retried.
///
/// # Examples
///
/// ```
/// use scieloapi::{Error, RetryPredicate};
///
/// struct AlsoRetryBadGateway;
///
/// impl RetryPredicate for AlsoRetryBadGateway {
///     fn should_retry(&self, error: &Error, _attempt: usize) -> bool {
///         error.is_retryable() || matches!(error, Error::BadGateway(_))
///     }
/// }
/// ```
pub trait RetryPredicate: Send + Sync {
    /// Determines whether the request should be retried based on the error.
    ///
    /// `attempt` is the number of the attempt that just failed (1-indexed).
    fn should_retry(&self, error: &Error, attempt: usize) -> bool;
}

/// Retry connectivity failures: connection errors and 503 responses.
///
/// This uses [`Error::is_retryable`].
#[derive(Debug, Clone, Copy)]
pub struct RetryOnConnectivity;

impl RetryPredicate for RetryOnConnectivity {
    fn should_retry(&self, error: &Error, _attempt: usize) -> bool {
        error.is_retryable()
    }
}

/// Blocks the calling thread between retry attempts.
pub trait Sleeper: Send + Sync {
    /// Pauses for `duration`.
    fn sleep(&self, duration: Duration);
}

/// Sleeps with [`std::thread::sleep`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}
