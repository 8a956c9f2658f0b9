use chrono::{Datelike, NaiveDate};

/// Name of the file storing data of the month `date` belongs to.
pub fn month_file_name(date: NaiveDate) -> String {
    format!("{:02}-{}.json", date.month(), date.year())
}

/// This is the standard way of showing a day in statistics. For example `Jan 01 2020`.
pub fn format_statistics_date(date: NaiveDate) -> String {
    date.format("%b %d %Y").to_string()
}

/// Formats milliseconds as hours and minutes, for example `1h 5min`.
pub fn format_duration_ms(ms: u64) -> String {
    let minutes = ms / 1000 / 60;
    format!("{}h {}min", minutes / 60, minutes % 60)
}
