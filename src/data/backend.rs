use std::{
    collections::BTreeMap,
    future::Future,
    io::ErrorKind,
    ops::Deref,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use fs4::tokio::AsyncFileExt;
use futures::future::try_join_all;
use tokio::{
    fs::{self, File},
    io::{AsyncReadExt, AsyncWriteExt},
};
use tracing::debug;

use crate::utils::time::month_file_name;

use super::{config::Config, entities::MonthData, error::CodeTimeError};

const MONTH_FILE_EXTENSION: &str = "json";
const STAGING_EXTENSION: &str = "json.tmp";

/// Years mapped to months mapped to the days that have recorded activity.
pub type DaysWithData = BTreeMap<i32, BTreeMap<u32, Vec<u32>>>;

/// Interface for abstracting storage of month data and config. Pure I/O, no business logic.
pub trait StorageBackend {
    /// Reads data of the month `date` belongs to. Fails with
    /// [CodeTimeError::MonthDataFileNotFound] when nothing was stored for that month.
    fn read_month_data(&self, date: NaiveDate) -> impl Future<Output = Result<MonthData>>;

    /// Replaces data of the month `date` belongs to.
    fn write_month_data(
        &self,
        data: &MonthData,
        date: NaiveDate,
    ) -> impl Future<Output = Result<()>>;

    fn read_config(&self) -> impl Future<Output = Result<Config>>;

    fn write_config(&self, config: &Config) -> impl Future<Output = Result<()>>;

    /// Years with at least one month file, ascending.
    fn get_existing_years(&self) -> impl Future<Output = Result<Vec<i32>>>;

    /// Months of `year` that have a month file, ascending.
    fn get_existing_months(&self, year: i32) -> impl Future<Output = Result<Vec<u32>>>;

    fn get_days_with_data(&self) -> impl Future<Output = Result<DaysWithData>> {
        async move {
            let mut result = DaysWithData::new();
            for year in self.get_existing_years().await? {
                let months = self.get_existing_months(year).await?;
                let reads = months.iter().map(|month| async move {
                    let date = NaiveDate::from_ymd_opt(year, *month, 1)
                        .with_context(|| format!("Invalid month {month}-{year}"))?;
                    let data = self.read_month_data(date).await?;
                    anyhow::Ok((*month, data.into_keys().collect::<Vec<_>>()))
                });
                result.insert(year, try_join_all(reads).await?.into_iter().collect());
            }
            Ok(result)
        }
    }
}

impl<T: Deref> StorageBackend for T
where
    T::Target: StorageBackend,
{
    fn read_month_data(&self, date: NaiveDate) -> impl Future<Output = Result<MonthData>> {
        self.deref().read_month_data(date)
    }

    fn write_month_data(
        &self,
        data: &MonthData,
        date: NaiveDate,
    ) -> impl Future<Output = Result<()>> {
        self.deref().write_month_data(data, date)
    }

    fn read_config(&self) -> impl Future<Output = Result<Config>> {
        self.deref().read_config()
    }

    fn write_config(&self, config: &Config) -> impl Future<Output = Result<()>> {
        self.deref().write_config(config)
    }

    fn get_existing_years(&self) -> impl Future<Output = Result<Vec<i32>>> {
        self.deref().get_existing_years()
    }

    fn get_existing_months(&self, year: i32) -> impl Future<Output = Result<Vec<u32>>> {
        self.deref().get_existing_months(year)
    }

    fn get_days_with_data(&self) -> impl Future<Output = Result<DaysWithData>> {
        self.deref().get_days_with_data()
    }
}

/// Parses a month file name of the form `MM-YYYY.json` into `(month, year)`.
pub fn parse_month_file_name(name: &str) -> Result<(u32, i32), CodeTimeError> {
    let invalid = || CodeTimeError::InvalidMonthDataFileName { name: name.into() };
    let stem = name
        .strip_suffix(MONTH_FILE_EXTENSION)
        .and_then(|v| v.strip_suffix('.'))
        .ok_or_else(invalid)?;
    let (month, year) = stem.split_once('-').ok_or_else(invalid)?;
    let digits = |v: &str, len: usize| v.len() == len && v.bytes().all(|b| b.is_ascii_digit());
    if !digits(month, 2) || !digits(year, 4) {
        return Err(invalid());
    }
    let month = month.parse::<u32>().map_err(|_| invalid())?;
    let year = year.parse::<i32>().map_err(|_| invalid())?;
    if !(1..=12).contains(&month) {
        return Err(invalid());
    }
    Ok((month, year))
}

/// Locations used by [JsonFileBackend].
#[derive(Debug, Clone)]
pub struct StoragePaths {
    pub data_dir: PathBuf,
    pub config_file: PathBuf,
}

impl StoragePaths {
    /// Standard layout inside an application directory.
    pub fn in_app_dir(app_dir: &Path) -> Self {
        Self {
            data_dir: app_dir.join("data"),
            config_file: app_dir.join("config.json"),
        }
    }
}

/// The main realization of [StorageBackend]. Every month lives in its own json file.
pub struct JsonFileBackend {
    paths: StoragePaths,
}

impl JsonFileBackend {
    pub fn new(paths: StoragePaths) -> Self {
        Self { paths }
    }

    pub fn month_file_path(&self, date: NaiveDate) -> PathBuf {
        self.paths.data_dir.join(month_file_name(date))
    }

    /// Collects `(month, year)` of every month file. A missing data directory means nothing
    /// was recorded yet.
    async fn scan_month_files(&self) -> Result<Vec<(u32, i32)>> {
        let mut entries = match fs::read_dir(&self.paths.data_dir).await {
            Ok(v) => v,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => Err(e)?,
        };

        let mut months = vec![];
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !entry.file_type().await?.is_file()
                || path.extension().and_then(|v| v.to_str()) != Some(MONTH_FILE_EXTENSION)
            {
                debug!("Skipping {path:?} during month discovery");
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            months.push(parse_month_file_name(&name)?);
        }
        Ok(months)
    }
}

impl StorageBackend for JsonFileBackend {
    async fn read_month_data(&self, date: NaiveDate) -> Result<MonthData> {
        let path = self.month_file_path(date);
        debug!("Reading month data from {path:?}");
        let mut file = match File::open(&path).await {
            Ok(v) => v,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(CodeTimeError::MonthDataFileNotFound { path }.into());
            }
            Err(e) => Err(e)?,
        };

        file.lock_shared()?;
        let mut content = String::new();
        let read = file.read_to_string(&mut content).await;
        file.unlock_async().await?;
        read?;

        let data = serde_json::from_str::<MonthData>(&content)
            .with_context(|| format!("Month data in {path:?} is malformed"))?;
        Ok(data)
    }

    async fn write_month_data(&self, data: &MonthData, date: NaiveDate) -> Result<()> {
        if data.is_empty() {
            Err(CodeTimeError::EmptyMonthData)?
        }
        let content = serde_json::to_vec(data)?;

        fs::create_dir_all(&self.paths.data_dir).await?;
        let path = self.month_file_path(date);
        debug!("Writing month data of {}-{} to {path:?}", date.month(), date.year());

        // Written next to the month file and renamed over it, so a crash never leaves a
        // partially written month behind.
        let staging = path.with_extension(STAGING_EXTENSION);
        let mut file = File::options()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&staging)
            .await?;

        file.lock_exclusive()?;
        let result = async {
            file.set_len(0).await?;
            file.write_all(&content).await?;
            file.sync_all().await?;
            fs::rename(&staging, &path).await
        }
        .await;
        file.unlock_async().await?;
        result.with_context(|| format!("Failed to replace month data in {path:?}"))?;
        Ok(())
    }

    async fn read_config(&self) -> Result<Config> {
        let path = &self.paths.config_file;
        let content = match fs::read_to_string(path).await {
            Ok(v) => v,
            Err(e) if e.kind() == ErrorKind::NotFound => Err(CodeTimeError::ConfigFileNotFound {
                path: path.clone(),
            })?,
            Err(e) => Err(e)?,
        };
        let config = serde_json::from_str(&content)
            .with_context(|| format!("Config in {path:?} is malformed"))?;
        Ok(config)
    }

    async fn write_config(&self, config: &Config) -> Result<()> {
        if config.is_empty() {
            Err(CodeTimeError::EmptyConfig)?
        }
        let content = serde_json::to_vec_pretty(config)?;
        let path = &self.paths.config_file;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        debug!("Writing config to {path:?}");
        fs::write(path, content).await?;
        Ok(())
    }

    async fn get_existing_years(&self) -> Result<Vec<i32>> {
        let mut years = self
            .scan_month_files()
            .await?
            .into_iter()
            .map(|(_, year)| year)
            .collect::<Vec<_>>();
        years.sort_unstable();
        years.dedup();
        Ok(years)
    }

    async fn get_existing_months(&self, year: i32) -> Result<Vec<u32>> {
        let mut months = self
            .scan_month_files()
            .await?
            .into_iter()
            .filter(|(_, file_year)| *file_year == year)
            .map(|(month, _)| month)
            .collect::<Vec<_>>();
        months.sort_unstable();
        months.dedup();
        Ok(months)
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::NaiveDate;
    use tempfile::{tempdir, TempDir};

    use crate::data::{
        config::Config,
        entities::{DayActivities, MonthData},
        error::{is_code_time_error, CodeTimeError},
    };

    use super::{parse_month_file_name, JsonFileBackend, StorageBackend, StoragePaths};

    fn create_backend() -> Result<(TempDir, JsonFileBackend)> {
        let dir = tempdir()?;
        let backend = JsonFileBackend::new(StoragePaths::in_app_dir(dir.path()));
        Ok((dir, backend))
    }

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn month_data() -> MonthData {
        MonthData::from([
            (1, DayActivities::from_iter([("PyCharm", 4000), ("IntelliJ", 1000)])),
            (17, DayActivities::from_iter([("Vim", 0)])),
        ])
    }

    #[tokio::test]
    async fn month_data_round_trip() -> Result<()> {
        let (_dir, backend) = create_backend()?;
        let data = month_data();
        backend.write_month_data(&data, date(2020, 1, 5)).await?;

        assert!(backend.month_file_path(date(2020, 1, 1)).ends_with("01-2020.json"));
        assert_eq!(backend.read_month_data(date(2020, 1, 28)).await?, data);
        Ok(())
    }

    #[tokio::test]
    async fn rewrite_replaces_previous_content() -> Result<()> {
        let (_dir, backend) = create_backend()?;
        backend.write_month_data(&month_data(), date(2020, 1, 1)).await?;

        let smaller = MonthData::from([(2, DayActivities::from_iter([("Vim", 1)]))]);
        backend.write_month_data(&smaller, date(2020, 1, 1)).await?;

        assert_eq!(backend.read_month_data(date(2020, 1, 1)).await?, smaller);
        Ok(())
    }

    #[tokio::test]
    async fn rewrite_leaves_no_staging_file() -> Result<()> {
        let (dir, backend) = create_backend()?;
        let data_dir = dir.path().join("data");
        std::fs::create_dir_all(&data_dir)?;
        // Left over from a write that was interrupted before the rename.
        std::fs::write(data_dir.join("01-2020.json.tmp"), "{\"1\": {\"Vi")?;
        assert!(backend.get_existing_years().await?.is_empty());

        backend.write_month_data(&month_data(), date(2020, 1, 1)).await?;
        backend.write_month_data(&month_data(), date(2020, 1, 1)).await?;

        let mut files = std::fs::read_dir(&data_dir)?
            .map(|v| Ok(v?.file_name().to_string_lossy().to_string()))
            .collect::<Result<Vec<_>>>()?;
        files.sort();
        assert_eq!(files, ["01-2020.json"]);
        assert_eq!(backend.read_month_data(date(2020, 1, 1)).await?, month_data());
        Ok(())
    }

    #[tokio::test]
    async fn missing_month_file() -> Result<()> {
        let (_dir, backend) = create_backend()?;
        let error = backend.read_month_data(date(2020, 1, 1)).await.unwrap_err();
        assert!(is_code_time_error(&error, |e| matches!(
            e,
            CodeTimeError::MonthDataFileNotFound { .. }
        )));
        Ok(())
    }

    #[tokio::test]
    async fn empty_month_data_is_never_written() -> Result<()> {
        let (dir, backend) = create_backend()?;
        let error = backend
            .write_month_data(&MonthData::new(), date(2020, 1, 1))
            .await
            .unwrap_err();
        assert!(is_code_time_error(&error, |e| matches!(
            e,
            CodeTimeError::EmptyMonthData
        )));
        assert!(!dir.path().join("data").exists());
        Ok(())
    }

    #[tokio::test]
    async fn config_round_trip() -> Result<()> {
        let (_dir, backend) = create_backend()?;
        let error = backend.read_config().await.unwrap_err();
        assert!(is_code_time_error(&error, |e| matches!(
            e,
            CodeTimeError::ConfigFileNotFound { .. }
        )));

        let config = Config {
            title_color: Some("#FFF".into()),
            activities: Some(vec!["PyCharm".into()]),
            ..Default::default()
        };
        backend.write_config(&config).await?;
        assert_eq!(backend.read_config().await?, config);
        Ok(())
    }

    #[tokio::test]
    async fn empty_config_is_never_written() -> Result<()> {
        let (dir, backend) = create_backend()?;
        let error = backend.write_config(&Config::default()).await.unwrap_err();
        assert!(is_code_time_error(&error, |e| matches!(
            e,
            CodeTimeError::EmptyConfig
        )));
        assert!(!dir.path().join("config.json").exists());
        Ok(())
    }

    #[tokio::test]
    async fn existing_years_and_months_are_sorted() -> Result<()> {
        let (_dir, backend) = create_backend()?;
        assert!(backend.get_existing_years().await?.is_empty());

        for (year, month) in [(2021, 3), (2020, 12), (2021, 1), (2020, 2)] {
            backend
                .write_month_data(&month_data(), date(year, month, 1))
                .await?;
        }

        assert_eq!(backend.get_existing_years().await?, [2020, 2021]);
        assert_eq!(backend.get_existing_months(2020).await?, [2, 12]);
        assert_eq!(backend.get_existing_months(2021).await?, [1, 3]);
        assert!(backend.get_existing_months(2019).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn unparsable_month_file_fails_discovery() -> Result<()> {
        let (dir, backend) = create_backend()?;
        backend.write_month_data(&month_data(), date(2020, 1, 1)).await?;
        std::fs::write(dir.path().join("data").join("notes.txt"), "ignored")?;
        assert_eq!(backend.get_existing_years().await?, [2020]);

        std::fs::write(dir.path().join("data").join("backup.json"), "{}")?;
        let error = backend.get_existing_years().await.unwrap_err();
        assert!(is_code_time_error(&error, |e| matches!(
            e,
            CodeTimeError::InvalidMonthDataFileName { name } if name == "backup.json"
        )));
        Ok(())
    }

    #[tokio::test]
    async fn days_with_data() -> Result<()> {
        let (_dir, backend) = create_backend()?;
        backend.write_month_data(&month_data(), date(2020, 1, 1)).await?;
        backend
            .write_month_data(
                &MonthData::from([(3, DayActivities::from_iter([("Vim", 5)]))]),
                date(2020, 2, 1),
            )
            .await?;
        backend.write_month_data(&month_data(), date(2021, 7, 1)).await?;

        let days = backend.get_days_with_data().await?;

        assert_eq!(days.len(), 2);
        assert_eq!(days[&2020][&1], [1, 17]);
        assert_eq!(days[&2020][&2], [3]);
        assert_eq!(days[&2021][&7], [1, 17]);
        Ok(())
    }

    #[test]
    fn month_file_names() {
        assert_eq!(parse_month_file_name("01-2020.json").unwrap(), (1, 2020));
        assert_eq!(parse_month_file_name("12-1999.json").unwrap(), (12, 1999));
        for name in [
            "1-2020.json", "13-2020.json", "01-2020.txt", "aa-2020.json", "012020.json",
            "+1-2020.json", "01-+020.json", " 1-2020.json",
        ] {
            assert!(
                matches!(
                    parse_month_file_name(name),
                    Err(CodeTimeError::InvalidMonthDataFileName { .. })
                ),
                "{name} should be rejected"
            );
        }
    }
}
