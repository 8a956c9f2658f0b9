use std::{sync::Arc, time::Duration};

use anyhow::Result;
use chrono::NaiveDateTime;
use tokio::{sync::mpsc, time::Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, Instrument};

use crate::{focus_api::FocusActivityProvider, utils::clock::Clock};

use super::{event::FocusInterval, pause::PauseState};

/// Application that currently has focus.
struct ActiveActivity {
    name: Arc<str>,
    /// Local wall time, only used to place the interval on a day.
    start: NaiveDateTime,
    /// Monotonic, so duration is not affected by daylight saving or clock adjustments.
    started: Instant,
}

impl ActiveActivity {
    fn finish(self, end: Instant) -> FocusInterval {
        let duration_ms = end.saturating_duration_since(self.started).as_millis() as u64;
        FocusInterval {
            name: self.name,
            start: self.start,
            duration_ms,
        }
    }
}

/// Polls the focused application and emits an interval every time focus moves elsewhere.
pub struct DataCollectionModule {
    next: mpsc::Sender<FocusInterval>,
    provider: Box<dyn FocusActivityProvider>,
    pause: Box<dyn PauseState>,
    shutdown: CancellationToken,
    collection_frequency: Duration,
    clock: Box<dyn Clock>,
    active: Option<ActiveActivity>,
}

impl DataCollectionModule {
    pub fn new(
        next: mpsc::Sender<FocusInterval>,
        provider: Box<dyn FocusActivityProvider>,
        pause: Box<dyn PauseState>,
        shutdown: CancellationToken,
        collection_frequency: Duration,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            next,
            provider,
            pause,
            shutdown,
            collection_frequency,
            clock,
            active: None,
        }
    }

    /// Records that `name` has focus. `now` anchors a new interval to a day, `instant` measures
    /// it. Returns the interval of the previous application if focus changed.
    fn observe(
        &mut self,
        name: Arc<str>,
        now: NaiveDateTime,
        instant: Instant,
    ) -> Option<FocusInterval> {
        match self.active.take() {
            Some(active) if active.name == name => {
                self.active = Some(active);
                None
            }
            previous => {
                self.active = Some(ActiveActivity {
                    name,
                    start: now,
                    started: instant,
                });
                previous.map(|v| v.finish(instant))
            }
        }
    }

    /// Ends the interval in progress, if any.
    fn interrupt(&mut self, instant: Instant) -> Option<FocusInterval> {
        self.active.take().map(|v| v.finish(instant))
    }

    async fn send(&self, interval: FocusInterval) -> Result<()> {
        let span = info_span!("Sending finished interval");
        debug!("Sending interval {:?}", interval);
        self.next
            .send(interval)
            .instrument(span)
            .await
            .inspect_err(|e| error!("Unexpected error during sending {e:?}"))?;
        Ok(())
    }

    async fn collect(&mut self) -> Result<()> {
        if self.pause.is_paused() {
            if let Some(interval) = self.interrupt(self.clock.instant()) {
                info!("Tracking paused, closing {:?}", interval);
                self.send(interval).await?;
            }
            return Ok(());
        }

        match self.provider.get_activity_name() {
            Ok(name) => {
                let now = self.clock.now();
                let instant = self.clock.instant();
                if let Some(interval) = self.observe(name, now, instant) {
                    self.send(interval).await?;
                }
            }
            Err(e) => {
                error!("Encountered an error during collection {:?}", e)
            }
        }
        Ok(())
    }

    /// Executes the collector event loop. On shutdown the interval in progress is sent as well.
    pub async fn run(mut self) -> Result<()> {
        let mut collection_point = self.clock.instant();
        loop {
            collection_point += self.collection_frequency;

            self.collect().await?;

            tokio::select! {
                // Dropping self afterwards closes the channel, which stops the processing module.
                _ = self.shutdown.cancelled() => {
                    if let Some(interval) = self.interrupt(self.clock.instant()) {
                        info!("Flushing interval in progress {:?}", interval);
                        self.send(interval).await?;
                    }
                    return Ok(())
                }
                _ = self.clock.sleep_until(collection_point) => ()
            }
        }
    }
}
