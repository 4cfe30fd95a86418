use std::future::Future;
use std::time::{Duration, Instant};

/// Time source for the poll loop.
///
/// The deadline is measured with `now`, never by counting ticks, so a clock
/// that jumps (slow requests, a manual test clock) still ends polling on time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

/// Tokio-backed clock; follows tokio's paused time in tests
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}
