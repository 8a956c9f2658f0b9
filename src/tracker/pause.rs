use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::Result;
use tokio::fs;
use tracing::info;

/// Tells the collector whether tracking is currently paused.
pub trait PauseState {
    fn is_paused(&self) -> bool;
}

/// Tracking is paused while a marker file exists in the application directory. The cli creates
/// and removes it, the running tracker checks it on every poll.
#[derive(Debug, Clone)]
pub struct PauseFile {
    path: PathBuf,
}

impl PauseFile {
    pub fn in_app_dir(app_dir: &Path) -> Self {
        Self {
            path: app_dir.join("paused"),
        }
    }

    /// Returns false if tracking was already paused.
    pub async fn pause(&self) -> Result<bool> {
        if self.is_paused() {
            return Ok(false);
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&self.path, b"").await?;
        info!("Paused tracking");
        Ok(true)
    }

    /// Returns false if tracking wasn't paused.
    pub async fn resume(&self) -> Result<bool> {
        match fs::remove_file(&self.path).await {
            Ok(()) => {
                info!("Resumed tracking");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

impl PauseState for PauseFile {
    fn is_paused(&self) -> bool {
        self.path.exists()
    }
}
