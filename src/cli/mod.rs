pub mod process;
pub mod settings;
pub mod stats;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use process::{restart_tracker, stop_trackers};
use settings::{process_settings_command, SettingsCommand};
use stats::{process_days_command, process_stats_command, StatsCommand};
use tracing::level_filters::LevelFilter;

use crate::{
    data::{
        backend::{JsonFileBackend, StoragePaths},
        repository::DataRepository,
    },
    tracker::{pause::PauseFile, start_tracker},
    utils::{
        dir::{create_application_default_path, create_application_path},
        logging::{enable_logging, CLI_PREFIX, TRACKER_PREFIX},
    },
};

#[derive(Parser, Debug)]
#[command(name = "codetime", version, long_about = None)]
#[command(about = "Tracks time spent in focused applications", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, help = "Enable logging")]
    log: bool,
    #[arg(
        long,
        global = true,
        help = "Application directory. By default uses $XDG_STATE_HOME/codetime or $HOME/.local/state/codetime"
    )]
    dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Starts tracking in the background, replacing a running tracker")]
    Init {},
    #[command(about = "Run the tracker directly in current console")]
    Serve {},
    #[command(about = "Stop currently running tracker")]
    Stop {},
    #[command(about = "Pause tracking without stopping the tracker")]
    Pause {},
    #[command(about = "Continue tracking after a pause")]
    Resume {},
    #[command(about = "Show how time was spent during a day")]
    Stats {
        #[command(flatten)]
        command: StatsCommand,
    },
    #[command(about = "List days that have recorded activity")]
    Days {},
    #[command(about = "Read or change settings")]
    Settings {
        #[command(subcommand)]
        command: SettingsCommand,
    },
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let app_dir = match args.dir {
        Some(dir) => create_application_path(dir)?,
        None => create_application_default_path()?,
    };

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    let prefix = match args.commands {
        Commands::Serve {} => TRACKER_PREFIX,
        _ => CLI_PREFIX,
    };
    enable_logging(prefix, &app_dir.join("logs"), logging_level, args.log)?;

    match args.commands {
        Commands::Init {} => restart_tracker(&app_dir),
        Commands::Stop {} => {
            stop_trackers(&std::env::current_exe()?);
            Ok(())
        }
        Commands::Pause {} => {
            match PauseFile::in_app_dir(&app_dir).pause().await? {
                true => println!("Tracking paused"),
                false => println!("Tracking is already paused"),
            }
            Ok(())
        }
        Commands::Resume {} => {
            match PauseFile::in_app_dir(&app_dir).resume().await? {
                true => println!("Tracking resumed"),
                false => println!("Tracking wasn't paused"),
            }
            Ok(())
        }
        Commands::Serve {} => start_tracker(&app_dir).await,
        Commands::Stats { command } => {
            process_stats_command(&mut open_repository(&app_dir).await?, command).await
        }
        Commands::Days {} => process_days_command(&open_repository(&app_dir).await?).await,
        Commands::Settings { command } => {
            process_settings_command(&mut open_repository(&app_dir).await?, command).await
        }
    }
}

/// Repository of the application directory. Writes default settings if there are none yet.
async fn open_repository(app_dir: &std::path::Path) -> Result<DataRepository<JsonFileBackend>> {
    let mut repository =
        DataRepository::new(JsonFileBackend::new(StoragePaths::in_app_dir(app_dir)));
    repository.ensure_config().await?;
    Ok(repository)
}
