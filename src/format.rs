//! Axis, tooltip and timezone labels for chart rendering.

use chrono::{DateTime, FixedOffset, Offset, SecondsFormat, Utc};

/// Display timezone: a fixed UTC offset plus the name shown next to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayZone {
    pub offset: FixedOffset,
    pub name: String,
}

impl DisplayZone {
    pub fn utc() -> Self {
        Self::from_offset_minutes(0, "UTC")
    }

    /// Out-of-range offsets (beyond ±24h) fall back to UTC.
    pub fn from_offset_minutes(minutes: i32, name: impl Into<String>) -> Self {
        let offset = minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix());
        Self {
            offset,
            name: name.into(),
        }
    }

    fn localize(&self, millis: i64) -> Option<DateTime<FixedOffset>> {
        DateTime::<Utc>::from_timestamp_millis(millis).map(|t| t.with_timezone(&self.offset))
    }

    /// `YYYY-MM-DD HH:mm` axis label.
    pub fn tick_label(&self, millis: i64) -> String {
        match self.localize(millis) {
            Some(t) => t.format("%Y-%m-%d %H:%M").to_string(),
            None => millis.to_string(),
        }
    }

    /// `{label} = {value} @ {timestamp}` hover text.
    pub fn tooltip_text(&self, label: &str, value: f64, millis: i64) -> String {
        let when = match self.localize(millis) {
            Some(t) => t.to_rfc3339_opts(SecondsFormat::Secs, false),
            None => millis.to_string(),
        };
        format!("{} = {} @ {}", label, value, when)
    }

    /// `[-]HH:MM name`, e.g. `-07:00 America/Los_Angeles`.
    pub fn label(&self) -> String {
        let total = self.offset.local_minus_utc() / 60;
        let sign = if total < 0 { "-" } else { "" };
        let total = total.abs();
        format!("{}{:02}:{:02} {}", sign, total / 60, total % 60, self.name)
    }
}
