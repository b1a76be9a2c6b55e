//! Per-worker pacing between lookups.
//!
//! Pacing spreads a worker's whois queries out so registries are less likely
//! to throttle us. It is not a rate limiter: there is no shared budget and no
//! backoff after failures.

use rand::Rng;
use std::time::Duration;

/// Decides how long a worker pauses after its `attempt`-th candidate.
///
/// Any `Fn(u64) -> Duration` closure is a pacing policy, which keeps tests
/// free of real sleeps.
pub trait Pacing: Send + Sync {
    fn delay(&self, attempt: u64) -> Duration;
}

impl<F> Pacing for F
where
    F: Fn(u64) -> Duration + Send + Sync,
{
    fn delay(&self, attempt: u64) -> Duration {
        self(attempt)
    }
}

/// Uniformly random pause in `[min, max]`.
#[derive(Debug, Clone, Copy)]
pub struct RandomPacing {
    min: Duration,
    max: Duration,
}

impl RandomPacing {
    /// Bounds given in the wrong order are swapped.
    pub fn new(min: Duration, max: Duration) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    pub fn bounds(&self) -> (Duration, Duration) {
        (self.min, self.max)
    }
}

impl Default for RandomPacing {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(3))
    }
}

impl Pacing for RandomPacing {
    fn delay(&self, _attempt: u64) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        let millis = rand::rng().random_range(self.min.as_millis()..=self.max.as_millis());
        Duration::from_millis(millis as u64)
    }
}

/// No pause at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPacing;

impl Pacing for NoPacing {
    fn delay(&self, _attempt: u64) -> Duration {
        Duration::ZERO
    }
}
