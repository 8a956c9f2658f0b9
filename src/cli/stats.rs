use std::fmt::{Display, Write};

use ansi_term::{Colour, Style};
use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use chrono_english::parse_date_string;
use clap::{CommandFactory, Parser, ValueEnum};

use crate::{
    data::{
        backend::StorageBackend,
        config::{SettingKey, SettingValue},
        repository::DataRepository,
        statistics::Statistics,
    },
    utils::time::format_duration_ms,
};

use super::Args;

const PROGRESS_BAR_WIDTH: usize = 30;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DateStyle {
    Uk,
    Us,
}

impl From<DateStyle> for chrono_english::Dialect {
    fn from(value: DateStyle) -> Self {
        match value {
            DateStyle::Uk => Self::Uk,
            DateStyle::Us => Self::Us,
        }
    }
}

impl Display for DateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateStyle::Uk => write!(f, "uk"),
            DateStyle::Us => write!(f, "us"),
        }
    }
}

#[derive(Debug, Parser)]
pub struct StatsCommand {
    #[arg(
        long,
        short,
        help = "Day to summarize. Examples are \"yesterday\", \"15/03/2025\". Defaults to today"
    )]
    date: Option<String>,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
    #[arg(long, help = "Print statistics as json")]
    json: bool,
}

fn parse_day(date: Option<String>, date_style: DateStyle) -> Result<NaiveDate> {
    let now = Local::now();
    match date.map(|s| parse_date_string(&s, now, date_style.into())) {
        Some(Ok(v)) => Ok(v.date_naive()),
        Some(Err(e)) => Err(Args::command()
            .error(
                clap::error::ErrorKind::ValueValidation,
                format!("Failed to validate date {e}"),
            )
            .into()),
        None => Ok(now.date_naive()),
    }
}

/// Colors used for printing statistics, taken from settings.
struct Theme {
    title: Style,
    total_time: Style,
    progress_background: Style,
    progress_foreground: Style,
    activity_title: Style,
    activity_time: Style,
    watermark: Style,
}

impl Theme {
    async fn load<B: StorageBackend>(repository: &mut DataRepository<B>) -> Result<Self> {
        Ok(Theme {
            title: setting_style(repository, SettingKey::TitleColor).await?.bold(),
            total_time: setting_style(repository, SettingKey::TotalTimeColor)
                .await?
                .bold(),
            progress_background: setting_style(repository, SettingKey::ProgressBackgroundColor)
                .await?,
            progress_foreground: setting_style(repository, SettingKey::ProgressForegroundColor)
                .await?,
            activity_title: setting_style(repository, SettingKey::ActivityTitleColor).await?,
            activity_time: setting_style(repository, SettingKey::ActivityTimeColor).await?,
            watermark: setting_style(repository, SettingKey::WatermarkColor)
                .await?
                .dimmed(),
        })
    }

    #[cfg(test)]
    fn plain() -> Self {
        Theme {
            title: Style::default(),
            total_time: Style::default(),
            progress_background: Style::default(),
            progress_foreground: Style::default(),
            activity_title: Style::default(),
            activity_time: Style::default(),
            watermark: Style::default(),
        }
    }
}

/// Unparsable colors fall back to the terminal default.
async fn setting_style<B: StorageBackend>(
    repository: &mut DataRepository<B>,
    key: SettingKey,
) -> Result<Style> {
    Ok(match repository.get_setting(key).await? {
        SettingValue::Text(v) => parse_hex_colour(&v)
            .map(|c| c.normal())
            .unwrap_or_default(),
        _ => Style::default(),
    })
}

/// Accepts `#RGB` and `#RRGGBB`.
fn parse_hex_colour(value: &str) -> Option<Colour> {
    let hex = value.strip_prefix('#')?;
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        3 => {
            let mut digits = hex.chars().map(|c| channel(&c.to_string()).map(|v| v * 17));
            Some(Colour::RGB(digits.next()??, digits.next()??, digits.next()??))
        }
        6 => Some(Colour::RGB(
            channel(hex.get(0..2)?)?,
            channel(hex.get(2..4)?)?,
            channel(hex.get(4..6)?)?,
        )),
        _ => None,
    }
}

fn render_statistics(statistics: &Statistics, theme: &Theme, username: &str) -> String {
    let mut output = String::new();
    let _ = writeln!(
        output,
        "{}",
        theme
            .title
            .paint(format!("Coding statistics of {}", statistics.date))
    );
    let _ = writeln!(
        output,
        "{}",
        theme
            .total_time
            .paint(format_duration_ms(statistics.total_time))
    );
    let _ = writeln!(output);

    let name_width = statistics
        .activities
        .iter()
        .map(|v| v.name.chars().count())
        .max()
        .unwrap_or(0);

    for activity in &statistics.activities {
        let filled = ((activity.progress * PROGRESS_BAR_WIDTH as f64).round() as usize)
            .min(PROGRESS_BAR_WIDTH);
        let _ = writeln!(
            output,
            "{}  {}{}  {:>10}",
            theme
                .activity_title
                .paint(format!("{:<name_width$}", activity.name)),
            theme.progress_foreground.paint("█".repeat(filled)),
            theme
                .progress_background
                .paint("░".repeat(PROGRESS_BAR_WIDTH - filled)),
            theme.activity_time.paint(format_duration_ms(activity.time)),
        );
    }

    let username = username.trim();
    let watermark = if username.is_empty() {
        "by codetime".to_string()
    } else {
        format!("by codetime for {username}")
    };
    let _ = writeln!(output);
    let _ = write!(output, "{}", theme.watermark.paint(watermark));
    output
}

/// Prints statistics of a single day.
pub async fn process_stats_command<B: StorageBackend>(
    repository: &mut DataRepository<B>,
    StatsCommand {
        date,
        date_style,
        json,
    }: StatsCommand,
) -> Result<()> {
    let day = parse_day(date, date_style)?;
    let statistics = repository.get_statistics(day).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&statistics)?);
        return Ok(());
    }

    let theme = Theme::load(repository).await?;
    let username = match repository.get_setting(SettingKey::Username).await? {
        SettingValue::Text(v) => v,
        _ => String::new(),
    };
    println!("{}", render_statistics(&statistics, &theme, &username));
    Ok(())
}

/// Prints every day with recorded activity grouped by year and month.
pub async fn process_days_command<B: StorageBackend>(repository: &DataRepository<B>) -> Result<()> {
    let days = repository.get_days_with_data().await?;
    if days.is_empty() {
        println!("Nothing was recorded yet");
        return Ok(());
    }

    for (year, months) in days {
        println!("{year}");
        for (month, days) in months {
            let first = NaiveDate::from_ymd_opt(year, month, 1)
                .with_context(|| format!("Invalid month {month}-{year}"))?;
            let days = days.iter().map(u32::to_string).collect::<Vec<_>>();
            println!("  {}: {}", first.format("%b"), days.join(", "));
        }
    }
    Ok(())
}
