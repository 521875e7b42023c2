//! Request pacing for the scrape loop.
//!
//! The scraper consults a [`RateLimiter`] before every breed-page fetch
//! and reports back once the fetch has finished. [`MinInterval`] enforces
//! a fixed pause between the end of one fetch and the start of the next;
//! [`NoDelay`] never waits and is what tests plug in.

use async_trait::async_trait;
use std::time::Duration;
use tokio::time::Instant;

#[async_trait]
pub trait RateLimiter: Send {
    /// Wait until the next request may be issued.
    async fn wait(&mut self);

    /// Record that the request issued after the last `wait` has completed.
    fn finished(&mut self) {}
}

/// Guarantees at least `interval` between a completed request (or, when
/// none was reported, the previous `wait`) and the next `wait` returning.
/// The first call never blocks.
pub struct MinInterval {
    interval: Duration,
    last: Option<Instant>,
}

impl MinInterval {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }
}

#[async_trait]
impl RateLimiter for MinInterval {
    async fn wait(&mut self) {
        if let Some(last) = self.last {
            let ready_at = last + self.interval;
            if Instant::now() < ready_at {
                tokio::time::sleep_until(ready_at).await;
            }
        }
        self.last = Some(Instant::now());
    }

    fn finished(&mut self) {
        self.last = Some(Instant::now());
    }
}

pub struct NoDelay;

#[async_trait]
impl RateLimiter for NoDelay {
    async fn wait(&mut self) {}
}

/// Pick a limiter for a configured delay; `0` disables pacing.
pub fn from_delay_ms(delay_ms: u64) -> Box<dyn RateLimiter> {
    if delay_ms == 0 {
        Box::new(NoDelay)
    } else {
        Box::new(MinInterval::new(Duration::from_millis(delay_ms)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn first_wait_is_immediate() {
        let mut limiter = MinInterval::new(Duration::from_secs(2));
        let start = Instant::now();
        limiter.wait().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn consecutive_waits_are_spaced() {
        let mut limiter = MinInterval::new(Duration::from_secs(2));
        let start = Instant::now();
        for _ in 0..3 {
            limiter.wait().await;
            limiter.finished();
        }
        assert!(start.elapsed() >= Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn elapsed_time_counts_toward_interval() {
        let mut limiter = MinInterval::new(Duration::from_secs(2));
        limiter.wait().await;
        limiter.finished();
        tokio::time::sleep(Duration::from_secs(3)).await;
        let before = Instant::now();
        limiter.wait().await;
        assert_eq!(before.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_request_still_gets_full_pause() {
        let mut limiter = MinInterval::new(Duration::from_secs(2));
        limiter.wait().await;
        // The request itself outlasts the interval.
        tokio::time::sleep(Duration::from_secs(3)).await;
        limiter.finished();
        let before = Instant::now();
        limiter.wait().await;
        assert_eq!(before.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test]
    async fn zero_delay_never_waits() {
        let mut limiter = from_delay_ms(0);
        let start = std::time::Instant::now();
        for _ in 0..5 {
            limiter.wait().await;
        }
        assert!(start.elapsed() < Duration::from_millis(100));
    }
}
