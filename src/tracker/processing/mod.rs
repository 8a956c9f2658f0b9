use anyhow::Result;
use module::EventProcessor;
use tokio::sync::mpsc::Receiver;
use tracing::{debug, error, info};

use super::event::FocusInterval;

pub mod module;
pub mod repository_save;

/// Receives finished intervals from the collector and hands them to a processor. It is the
/// only place that writes tracked data, so ingestion has a single writer.
pub struct ProcessingModule<Processor> {
    receiver: Receiver<FocusInterval>,
    processor: Processor,
}

impl<P: EventProcessor> ProcessingModule<P> {
    pub fn new(receiver: Receiver<FocusInterval>, processor: P) -> Self {
        Self {
            receiver,
            processor,
        }
    }

    /// Runs until the sending side is dropped.
    pub async fn run(mut self) -> Result<()> {
        while let Some(interval) = self.receiver.recv().await {
            debug!("Processing interval {:?}", interval);
            match self.processor.process_next(interval.clone()).await {
                Ok(_) => {
                    info!("Processed interval {:?}", interval)
                }
                Err(e) => {
                    error!("Error processing interval {:?}: {e:?}", interval)
                }
            }
        }

        let result = self.processor.finalize().await;
        self.receiver.close();
        result
    }
}
