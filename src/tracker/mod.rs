//! The long running part of the application. [collector::DataCollectionModule] polls the focused
//! application and sends finished [event::FocusInterval]s to a
//! [processing::ProcessingModule], which merges them into stored data.

use std::{path::Path, time::Duration};

use anyhow::Result;
use collector::DataCollectionModule;
use event::FocusInterval;
use pause::{PauseFile, PauseState};
use processing::{repository_save::RepositorySaver, ProcessingModule};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::{
    data::{
        backend::{JsonFileBackend, StoragePaths},
        repository::DataRepository,
    },
    focus_api::{FocusActivityProvider, GenericFocusProvider},
    utils::clock::{Clock, DefaultClock},
};

pub mod collector;
pub mod event;
pub mod pause;
pub mod processing;
pub mod shutdown;

const DEFAULT_COLLECTION_INTERVAL: Duration = Duration::from_secs(1);

/// Tracks focused applications until the process is asked to stop.
pub async fn start_tracker(app_dir: &Path) -> Result<()> {
    let (sender, receiver) = mpsc::channel::<FocusInterval>(10);
    let provider = GenericFocusProvider::new()?;

    let shutdown_token = CancellationToken::new();

    let collector = create_collector(
        sender,
        provider,
        PauseFile::in_app_dir(app_dir),
        &shutdown_token,
        DefaultClock,
    );

    let processor = create_processor(StoragePaths::in_app_dir(app_dir), receiver).await?;

    info!("Tracking focus in {app_dir:?}");
    let (_, collection_result, processing_result) = tokio::join!(
        shutdown::detect_shutdown(shutdown_token.clone()),
        async {
            let result = collector.run().await;
            shutdown_token.cancel();
            result
        },
        processor.run(),
    );

    if let Err(collection_result) = collection_result {
        error!("Collection module got an error {:?}", collection_result);
    }

    if let Err(processing_result) = processing_result {
        error!("Processing module got an error {:?}", processing_result);
    }

    Ok(())
}

fn create_collector(
    sender: mpsc::Sender<FocusInterval>,
    provider: impl FocusActivityProvider + 'static,
    pause: impl PauseState + 'static,
    shutdown_token: &CancellationToken,
    clock: impl Clock,
) -> DataCollectionModule {
    DataCollectionModule::new(
        sender,
        Box::new(provider),
        Box::new(pause),
        shutdown_token.clone(),
        DEFAULT_COLLECTION_INTERVAL,
        Box::new(clock),
    )
}

async fn create_processor(
    paths: StoragePaths,
    receiver: mpsc::Receiver<FocusInterval>,
) -> Result<ProcessingModule<RepositorySaver<JsonFileBackend>>> {
    let mut repository = DataRepository::new(JsonFileBackend::new(paths));
    repository.ensure_config().await?;
    Ok(ProcessingModule::new(
        receiver,
        RepositorySaver::new(repository),
    ))
}
