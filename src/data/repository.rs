use std::collections::{hash_map::Entry, BTreeMap, HashMap};

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};
use tracing::{debug, info, instrument};

use super::{
    backend::{DaysWithData, StorageBackend},
    config::{Config, SettingKey, SettingValue},
    entities::{DayDataEntry, MonthData},
    error::{is_code_time_error, CodeTimeError},
    statistics::{compute_statistics, Statistics},
};

const DAY_MS: u64 = 24 * 60 * 60 * 1000;

/// Key under which month data of `date` is cached.
pub fn cache_key(date: NaiveDate) -> String {
    format!("{}-{}", date.month(), date.year())
}

/// Milliseconds left from `time` until the end of its day.
fn ms_until_midnight(time: NaiveTime) -> u64 {
    // Leap seconds are reported as nanoseconds above one second.
    let elapsed = time.num_seconds_from_midnight() as u64 * 1000
        + (time.nanosecond() / 1_000_000).min(999) as u64;
    DAY_MS - elapsed
}

/// In-memory state of a [DataRepository]. Never evicted, so it should only be shared by
/// a single writer.
#[derive(Debug, Default)]
pub struct RepositoryCache {
    month_data: HashMap<String, MonthData>,
    config: Option<Config>,
}

/// Combines storage with caching and everything that is computed from stored data.
pub struct DataRepository<B: StorageBackend> {
    backend: B,
    cache: RepositoryCache,
}

impl<B: StorageBackend> DataRepository<B> {
    pub fn new(backend: B) -> Self {
        Self::with_cache(backend, RepositoryCache::default())
    }

    pub fn with_cache(backend: B, cache: RepositoryCache) -> Self {
        Self { backend, cache }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    async fn cached_month(&mut self, date: NaiveDate) -> Result<&mut MonthData> {
        let key = cache_key(date);
        let entry = match self.cache.month_data.entry(key) {
            Entry::Occupied(entry) => return Ok(entry.into_mut()),
            Entry::Vacant(entry) => entry,
        };
        let data = match self.backend.read_month_data(date).await {
            Ok(v) => v,
            Err(e)
                if is_code_time_error(&e, |e| {
                    matches!(e, CodeTimeError::MonthDataFileNotFound { .. })
                }) =>
            {
                debug!("No month data for {}, starting empty", entry.key());
                MonthData::new()
            }
            Err(e) => return Err(e),
        };
        Ok(entry.insert(data))
    }

    /// Returns month data of `date`. Storage is only read the first time a month is requested,
    /// a month without a file is treated as empty.
    pub async fn get_month_data(&mut self, date: NaiveDate) -> Result<&MonthData> {
        Ok(self.cached_month(date).await?)
    }

    /// Merges a finished interval into the stored totals. Intervals that run past midnight are
    /// split, every day receives the part that happened during it.
    #[instrument(skip(self))]
    pub async fn add_day_data(&mut self, entry: DayDataEntry, date: NaiveDate) -> Result<()> {
        let mut date = date;
        let mut start_time = entry.start_time;
        let mut remaining = entry.time;

        loop {
            let until_midnight = ms_until_midnight(start_time);
            if remaining <= until_midnight {
                return self.accumulate(&entry.name, remaining, date).await;
            }

            self.accumulate(&entry.name, until_midnight, date).await?;
            remaining -= until_midnight;
            date = date
                .succ_opt()
                .with_context(|| format!("No day follows {date}"))?;
            start_time = NaiveTime::MIN;
        }
    }

    async fn accumulate(&mut self, name: &str, time: u64, date: NaiveDate) -> Result<()> {
        let month = self.cached_month(date).await?;
        month.entry(date.day()).or_default().add(name, time);
        info!("Added {time}ms of {name} to {date}");

        let month = &self.cache.month_data[&cache_key(date)];
        self.backend.write_month_data(month, date).await
    }

    /// Summary of `date` used for rendering.
    #[instrument(skip(self))]
    pub async fn get_statistics(&mut self, date: NaiveDate) -> Result<Statistics> {
        let month = self.get_month_data(date).await?;
        let day = month
            .get(&date.day())
            .ok_or(CodeTimeError::DataNotAvailable { date })?;
        Ok(compute_statistics(date, day))
    }

    pub async fn get_days_with_data(&self) -> Result<DaysWithData> {
        self.backend.get_days_with_data().await
    }

    pub async fn get_months_with_data(&self) -> Result<BTreeMap<i32, Vec<u32>>> {
        let days = self.get_days_with_data().await?;
        Ok(days
            .into_iter()
            .map(|(year, months)| (year, months.into_keys().collect()))
            .collect())
    }

    pub async fn get_years_with_data(&self) -> Result<Vec<i32>> {
        let days = self.get_days_with_data().await?;
        Ok(days.into_keys().collect())
    }

    /// Returns the config, reading it from storage only once.
    pub async fn get_config(&mut self) -> Result<&Config> {
        let config = match self.cache.config.take() {
            Some(v) => v,
            None => self.backend.read_config().await?,
        };
        Ok(self.cache.config.insert(config))
    }

    /// Forgets the cached config. Other processes may have rewritten it since it was read.
    pub fn invalidate_config(&mut self) {
        self.cache.config = None;
    }

    pub async fn write_config(&mut self, config: Config) -> Result<()> {
        self.backend.write_config(&config).await?;
        self.cache.config = Some(config);
        Ok(())
    }

    /// Writes default settings when there is no config yet.
    pub async fn ensure_config(&mut self) -> Result<()> {
        let loaded = self.get_config().await.map(|_| ());
        match loaded {
            Ok(()) => Ok(()),
            Err(e)
                if is_code_time_error(&e, |e| {
                    matches!(e, CodeTimeError::ConfigFileNotFound { .. })
                }) =>
            {
                info!("No config found, writing defaults");
                self.write_config(Config::defaults()).await
            }
            Err(e) => Err(e),
        }
    }

    pub async fn get_setting(&mut self, key: SettingKey) -> Result<SettingValue> {
        let config = self.get_config().await?;
        Ok(config.get(key).unwrap_or_else(|| key.default_value()))
    }

    /// Default of a setting by its name.
    pub fn get_default_setting(name: &str) -> Result<SettingValue> {
        let key = name.parse::<SettingKey>()?;
        Ok(key.default_value())
    }

    #[instrument(skip(self))]
    pub async fn update_setting(&mut self, key: SettingKey, value: SettingValue) -> Result<()> {
        let mut config = self.get_config().await?.clone();
        config.set(key, value)?;
        self.write_config(config).await
    }

    pub async fn reset_setting(&mut self, key: SettingKey) -> Result<()> {
        self.update_setting(key, key.default_value()).await
    }

    pub async fn reset_settings(&mut self) -> Result<()> {
        self.write_config(Config::defaults()).await
    }

    /// Applications whose focus time is recorded.
    pub async fn tracked_activities(&mut self) -> Result<Vec<String>> {
        match self.get_setting(SettingKey::Activities).await? {
            SettingValue::List(v) => Ok(v),
            _ => Err(CodeTimeError::InvalidSettingValue {
                key: SettingKey::Activities.as_str(),
            }
            .into()),
        }
    }

    /// Starts recording `name`. Returns false if it was already recorded.
    pub async fn track_activity(&mut self, name: &str) -> Result<bool> {
        let mut activities = self.tracked_activities().await?;
        if activities.iter().any(|v| v == name) {
            return Ok(false);
        }
        activities.push(name.into());
        self.update_setting(SettingKey::Activities, SettingValue::List(activities))
            .await?;
        Ok(true)
    }

    /// Stops recording `name`. Returns false if it wasn't recorded.
    pub async fn untrack_activity(&mut self, name: &str) -> Result<bool> {
        let mut activities = self.tracked_activities().await?;
        let before = activities.len();
        activities.retain(|v| v != name);
        if activities.len() == before {
            return Ok(false);
        }
        self.update_setting(SettingKey::Activities, SettingValue::List(activities))
            .await?;
        Ok(true)
    }
}
