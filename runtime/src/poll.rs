//! Bounded polling with a fixed interval.
//!
//! Used for remote status checks that settle asynchronously (for example a
//! payment that the gateway confirms a few seconds after the customer
//! returns). Unlike a retry loop, a failed probe is not an error: the probe
//! itself decides whether the observed value is final.
//!
//! # Example
//!
//! ```rust
//! use coral_runtime::poll::{poll_until, PollOutcome, PollPolicy, Probe};
//! use std::time::Duration;
//!
//! # async fn example() {
//! let policy = PollPolicy::new(5, Duration::from_millis(10));
//!
//! let outcome = poll_until(&policy, |attempt| async move {
//!     if attempt >= 2 { Probe::Ready("paid") } else { Probe::Pending }
//! })
//! .await;
//!
//! assert_eq!(outcome, PollOutcome::Settled("paid"));
//! # }
//! ```

use std::future::Future;
use std::time::Duration;

/// How many times to probe and how long to wait between probes.
///
/// # Default Values
///
/// - `max_attempts`: 5
/// - `interval`: 2 seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Total number of probes, including the first one
    pub max_attempts: u32,
    /// Wait between consecutive probes
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            interval: Duration::from_secs(2),
        }
    }
}

impl PollPolicy {
    /// Create a policy; zero attempts is raised to one
    #[must_use]
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            interval,
        }
    }

    /// Upper bound on the time spent sleeping between probes
    #[must_use]
    pub fn max_wait(&self) -> Duration {
        self.interval * self.max_attempts.saturating_sub(1)
    }
}

/// Result of a single probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe<T> {
    /// Final value observed; stop polling
    Ready(T),
    /// Not settled yet; probe again after the interval
    Pending,
}

/// Result of a whole polling run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T> {
    /// A probe returned a final value
    Settled(T),
    /// Every attempt came back pending
    Exhausted {
        /// Number of probes made
        attempts: u32,
    },
}

/// Probe until a final value is observed or the attempts run out.
///
/// `probe` receives the zero-based attempt number. There is no sleep before
/// the first probe and none after the last.
pub async fn poll_until<F, Fut, T>(policy: &PollPolicy, mut probe: F) -> PollOutcome<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Probe<T>>,
{
    let attempts = policy.max_attempts.max(1);

    for attempt in 0..attempts {
        if attempt > 0 {
            tokio::time::sleep(policy.interval).await;
        }

        match probe(attempt).await {
            Probe::Ready(value) => {
                metrics::counter!("poll.settled.total").increment(1);
                tracing::debug!(attempt, "Poll settled");
                return PollOutcome::Settled(value);
            },
            Probe::Pending => {
                tracing::trace!(attempt, "Poll still pending");
            },
        }
    }

    metrics::counter!("poll.exhausted.total").increment(1);
    tracing::info!(attempts, "Poll attempts exhausted without a final value");
    PollOutcome::Exhausted { attempts }
}
