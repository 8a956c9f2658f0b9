use std::{collections::BTreeMap, fmt, sync::Arc};

use chrono::NaiveTime;
use serde::{
    de::{MapAccess, Visitor},
    Deserialize, Deserializer, Serialize, Serializer,
};

/// Accumulated milliseconds per application for one day.
///
/// Applications keep the order in which they were first recorded. The order survives a round
/// trip through json, which matters because statistics break ties by it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DayActivities(Vec<(Arc<str>, u64)>);

impl DayActivities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<u64> {
        self.0
            .iter()
            .find(|(key, _)| key.as_ref() == name)
            .map(|(_, time)| *time)
    }

    /// Adds `time` to an application, registering it at the end if it's new.
    pub fn add(&mut self, name: &str, time: u64) {
        match self.0.iter_mut().find(|(key, _)| key.as_ref() == name) {
            Some((_, total)) => *total = total.saturating_add(time),
            None => self.0.push((name.into(), time)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Arc<str>, u64)> {
        self.0.iter().map(|(name, time)| (name, *time))
    }

    pub fn total(&self) -> u64 {
        self.0.iter().map(|(_, time)| time).sum()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<Arc<str>>> FromIterator<(S, u64)> for DayActivities {
    fn from_iter<T: IntoIterator<Item = (S, u64)>>(iter: T) -> Self {
        let mut activities = DayActivities::new();
        for (name, time) in iter {
            let name: Arc<str> = name.into();
            activities.add(&name, time);
        }
        activities
    }
}

impl Serialize for DayActivities {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_map(self.0.iter().map(|(name, time)| (name.as_ref(), time)))
    }
}

impl<'de> Deserialize<'de> for DayActivities {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ActivitiesVisitor;

        impl<'de> Visitor<'de> for ActivitiesVisitor {
            type Value = DayActivities;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map of application names to milliseconds")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut activities = DayActivities::new();
                while let Some((name, time)) = map.next_entry::<String, u64>()? {
                    activities.add(&name, time);
                }
                Ok(activities)
            }
        }

        deserializer.deserialize_map(ActivitiesVisitor)
    }
}

/// Per day of month activity totals for a single month. One instance is stored per file.
pub type MonthData = BTreeMap<u32, DayActivities>;

/// A finished focus interval of a single application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayDataEntry {
    pub name: Arc<str>,
    /// Duration in milliseconds.
    pub time: u64,
    pub start_time: NaiveTime,
}

impl DayDataEntry {
    pub fn new(name: impl Into<Arc<str>>, time: u64, start_time: NaiveTime) -> Self {
        Self {
            name: name.into(),
            time,
            start_time,
        }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;

    use super::*;

    #[test]
    fn keeps_insertion_order() -> Result<()> {
        let json = r#"{"Vim": 10, "Alacritty": 30, "Firefox": 20}"#;
        let activities: DayActivities = serde_json::from_str(json)?;
        let names = activities
            .iter()
            .map(|(name, _)| name.to_string())
            .collect::<Vec<_>>();
        assert_eq!(names, ["Vim", "Alacritty", "Firefox"]);
        assert_eq!(
            serde_json::to_string(&activities)?,
            r#"{"Vim":10,"Alacritty":30,"Firefox":20}"#
        );
        Ok(())
    }

    #[test]
    fn add_accumulates_existing_application() {
        let mut activities = DayActivities::new();
        activities.add("PyCharm", 4000);
        activities.add("IntelliJ", 1000);
        activities.add("PyCharm", 500);

        assert_eq!(activities.get("PyCharm"), Some(4500));
        assert_eq!(activities.get("IntelliJ"), Some(1000));
        assert_eq!(activities.len(), 2);
        assert_eq!(activities.total(), 5500);
    }

    #[test]
    fn month_data_uses_numeric_day_keys() -> Result<()> {
        let month: MonthData = serde_json::from_str(r#"{"1": {"PyCharm": 4000}, "12": {}}"#)?;
        assert_eq!(month.keys().copied().collect::<Vec<_>>(), [1, 12]);
        assert_eq!(month[&1].get("PyCharm"), Some(4000));
        Ok(())
    }

    #[test]
    fn rejects_negative_durations() {
        let result = serde_json::from_str::<DayActivities>(r#"{"Vim": -1}"#);
        assert!(result.is_err());
    }
}
