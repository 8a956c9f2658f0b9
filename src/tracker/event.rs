use std::sync::Arc;

use chrono::NaiveDateTime;

/// A finished stretch of time during which one application had focus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusInterval {
    pub name: Arc<str>,
    /// Local wall time at which the application gained focus.
    pub start: NaiveDateTime,
    pub duration_ms: u64,
}
