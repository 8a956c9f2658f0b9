use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};
use tokio::time::Instant;

/// Source of time for the tracker. Intervals are attributed to days in local wall time, so
/// [Clock::now] is naive local time. Swapped out in tests.
#[async_trait]
pub trait Clock: Sync + Send + 'static {
    fn now(&self) -> NaiveDateTime;

    fn instant(&self) -> Instant;

    async fn sleep_until(&self, instant: Instant);
}

pub struct DefaultClock;

#[async_trait]
impl Clock for DefaultClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }

    fn instant(&self) -> Instant {
        Instant::now()
    }

    async fn sleep_until(&self, instant: Instant) {
        tokio::time::sleep_until(instant).await;
    }
}
