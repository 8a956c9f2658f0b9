use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

/// Failures produced by the data layer. They are carried inside [anyhow::Error] and can be
/// recovered with `downcast_ref`.
#[derive(Debug, Error)]
pub enum CodeTimeError {
    #[error("Could not load tracking data of month from {path:?}")]
    MonthDataFileNotFound { path: PathBuf },

    #[error("Tried to write empty month data")]
    EmptyMonthData,

    #[error("Could not find config file {path:?}")]
    ConfigFileNotFound { path: PathBuf },

    #[error("Tried to write empty config")]
    EmptyConfig,

    #[error("Invalid name for month data file: {name}")]
    InvalidMonthDataFileName { name: String },

    #[error("Invalid settings-key: {name}")]
    DefaultSettingNotFound { name: String },

    #[error("No data available for {date}")]
    DataNotAvailable { date: NaiveDate },

    #[error("Value doesn't fit setting {key}")]
    InvalidSettingValue { key: &'static str },
}

/// Checks whether `error` carries a specific [CodeTimeError] variant.
pub fn is_code_time_error(error: &anyhow::Error, f: impl Fn(&CodeTimeError) -> bool) -> bool {
    error.downcast_ref::<CodeTimeError>().is_some_and(f)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            CodeTimeError::EmptyMonthData.to_string(),
            "Tried to write empty month data"
        );
        assert_eq!(
            CodeTimeError::DefaultSettingNotFound {
                name: "colour".into()
            }
            .to_string(),
            "Invalid settings-key: colour"
        );
        assert_eq!(
            CodeTimeError::DataNotAvailable {
                date: NaiveDate::from_ymd_opt(2020, 1, 2).unwrap()
            }
            .to_string(),
            "No data available for 2020-01-02"
        );
    }

    #[test]
    fn survives_anyhow_wrapping() {
        let error: anyhow::Error = CodeTimeError::EmptyConfig.into();
        let error = error.context("Writing config");
        assert!(is_code_time_error(&error, |e| matches!(
            e,
            CodeTimeError::EmptyConfig
        )));
        assert!(!is_code_time_error(&error, |e| matches!(
            e,
            CodeTimeError::EmptyMonthData
        )));
    }
}
