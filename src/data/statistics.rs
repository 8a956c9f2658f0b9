use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;

use crate::utils::time::format_statistics_date;

use super::entities::DayActivities;

/// Amount of activities that are shown as is. Everything after is merged together.
const RANKED_ACTIVITIES: usize = 3;
/// Amount of merged activities that are mentioned by name.
const NAMED_SUMMARIZED_ACTIVITIES: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityShare {
    pub name: Arc<str>,
    pub time: u64,
    /// Share of the day total in `[0, 1]`.
    pub progress: f64,
}

/// Summary of a single day used for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
    pub date: String,
    pub total_time: u64,
    pub activities: Vec<ActivityShare>,
}

pub fn compute_statistics(date: NaiveDate, day: &DayActivities) -> Statistics {
    let total_time = day.total();

    let mut sorted = day
        .iter()
        .map(|(name, time)| (name.clone(), time))
        .collect::<Vec<_>>();
    // Stable, so equal times keep the order they were recorded in.
    sorted.sort_by(|a, b| b.1.cmp(&a.1));

    let activities = summarize_activities(sorted)
        .into_iter()
        .map(|(name, time)| ActivityShare {
            name,
            time,
            progress: progress(time, total_time),
        })
        .collect();

    Statistics {
        date: format_statistics_date(date),
        total_time,
        activities,
    }
}

fn progress(time: u64, total_time: u64) -> f64 {
    if total_time == 0 {
        0.0
    } else {
        time as f64 / total_time as f64
    }
}

/// Keeps the first [RANKED_ACTIVITIES] and merges the rest into one entry. The merged entry
/// names at most [NAMED_SUMMARIZED_ACTIVITIES] + 1 activities, longer tails end with "and more".
fn summarize_activities(mut activities: Vec<(Arc<str>, u64)>) -> Vec<(Arc<str>, u64)> {
    if activities.len() <= RANKED_ACTIVITIES {
        return activities;
    }

    let summarized = activities.split_off(RANKED_ACTIVITIES);
    let time = summarized.iter().map(|(_, time)| time).sum();

    let named = summarized.len().min(NAMED_SUMMARIZED_ACTIVITIES);
    let mut name = summarized[..named]
        .iter()
        .map(|(name, _)| name.as_ref())
        .collect::<Vec<_>>()
        .join(", ");

    match &summarized[named..] {
        [] => {}
        [(last, _)] => {
            name.push_str(" and ");
            name.push_str(last);
        }
        [_, _, ..] => name.push_str(" and more"),
    }

    activities.push((name.into(), time));
    activities
}
