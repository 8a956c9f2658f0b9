use anyhow::Result;
use tracing::{debug, info};

use crate::{
    data::{backend::StorageBackend, entities::DayDataEntry, repository::DataRepository},
    tracker::event::FocusInterval,
};

use super::module::EventProcessor;

/// Bridges [ProcessingModule](super::ProcessingModule) and [DataRepository]. Only applications
/// listed in the `activities` setting are stored. The setting is read again for every interval,
/// so changes made through the cli apply to a running tracker.
pub struct RepositorySaver<B: StorageBackend> {
    repository: DataRepository<B>,
}

impl<B: StorageBackend> RepositorySaver<B> {
    pub fn new(repository: DataRepository<B>) -> Self {
        Self { repository }
    }

    async fn is_tracked(&mut self, name: &str) -> Result<bool> {
        self.repository.invalidate_config();
        self.repository.ensure_config().await?;
        let activities = self.repository.tracked_activities().await?;
        Ok(activities.iter().any(|v| v == name))
    }
}

impl<B: StorageBackend> EventProcessor for RepositorySaver<B> {
    async fn process_next(&mut self, message: FocusInterval) -> Result<()> {
        if !self.is_tracked(&message.name).await? {
            debug!("Skipping untracked {}", message.name);
            return Ok(());
        }

        let entry = DayDataEntry::new(message.name, message.duration_ms, message.start.time());
        self.repository
            .add_day_data(entry, message.start.date())
            .await
    }

    async fn finalize(&mut self) -> Result<()> {
        info!("Stopped saving intervals");
        Ok(())
    }
}
