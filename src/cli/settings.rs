use anyhow::Result;
use clap::Subcommand;

use crate::data::{
    backend::StorageBackend,
    config::{SettingKey, SettingValue},
    repository::DataRepository,
};

#[derive(Subcommand, Debug)]
pub enum SettingsCommand {
    #[command(about = "Print every setting with its current value")]
    List {},
    #[command(about = "Print the current value of a setting")]
    Get { key: SettingKey },
    #[command(
        about = "Change a setting. Json arrays and objects are accepted for list and map settings"
    )]
    Set { key: SettingKey, value: String },
    #[command(about = "Restore the default of a setting, or of all settings if no key is given")]
    Reset { key: Option<SettingKey> },
    #[command(about = "Print the default value of a setting")]
    Default { name: String },
    #[command(about = "Record time spent in an application")]
    Track { name: String },
    #[command(about = "Stop recording time spent in an application")]
    Untrack { name: String },
}

pub async fn process_settings_command<B: StorageBackend>(
    repository: &mut DataRepository<B>,
    command: SettingsCommand,
) -> Result<()> {
    for line in apply_settings_command(repository, command).await? {
        println!("{line}");
    }
    Ok(())
}

/// Runs the command and returns the lines to report.
async fn apply_settings_command<B: StorageBackend>(
    repository: &mut DataRepository<B>,
    command: SettingsCommand,
) -> Result<Vec<String>> {
    let lines = match command {
        SettingsCommand::List {} => {
            let mut lines = Vec::with_capacity(SettingKey::ALL.len());
            for key in SettingKey::ALL {
                lines.push(format!("{key}: {}", repository.get_setting(key).await?));
            }
            lines
        }
        SettingsCommand::Get { key } => vec![repository.get_setting(key).await?.to_string()],
        SettingsCommand::Set { key, value } => {
            let value = SettingValue::parse(&value);
            repository.update_setting(key, value.clone()).await?;
            vec![format!("{key} set to {value}")]
        }
        SettingsCommand::Reset { key: Some(key) } => {
            repository.reset_setting(key).await?;
            vec![format!("{key} reset to {}", key.default_value())]
        }
        SettingsCommand::Reset { key: None } => {
            repository.reset_settings().await?;
            vec!["All settings were reset".into()]
        }
        SettingsCommand::Default { name } => {
            vec![DataRepository::<B>::get_default_setting(&name)?.to_string()]
        }
        SettingsCommand::Track { name } => match repository.track_activity(&name).await? {
            true => vec![format!("Tracking {name}")],
            false => vec![format!("{name} is already tracked")],
        },
        SettingsCommand::Untrack { name } => match repository.untrack_activity(&name).await? {
            true => vec![format!("Stopped tracking {name}")],
            false => vec![format!("{name} wasn't tracked")],
        },
    };
    Ok(lines)
}
