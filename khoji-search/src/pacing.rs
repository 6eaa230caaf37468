//! Minimum-interval pacing between sequential external calls.
//!
//! A [`Pacer`] is owned by one sequential loop and never shared. The first
//! [`ready`](Pacer::ready) returns at once; each later call waits until the
//! interval has passed since the previous one.

use std::time::Duration;

use tokio::time::Instant;

/// Spaces out calls to external services by a fixed minimum interval.
#[derive(Debug)]
pub struct Pacer {
    interval: Duration,
    last: Option<Instant>,
}

impl Pacer {
    /// Create a pacer. A zero interval never waits.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// The configured interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait until the next call is allowed, then mark it as taken.
    pub async fn ready(&mut self) {
        if let Some(last) = self.last {
            let next = last + self.interval;
            if Instant::now() < next {
                tokio::time::sleep_until(next).await;
            }
        }
        self.last = Some(Instant::now());
    }
}
