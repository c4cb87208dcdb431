//! Duration units and descriptors for window sizes.
//!
//! `describe` picks the largest of MONTHS, WEEKS, DAYS or HOURS that divides a
//! span exactly; `to_millis` goes the other way.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

const SECOND_MS: i64 = 1000;
const MINUTE_MS: i64 = 60 * SECOND_MS;
const HOUR_MS: i64 = 60 * MINUTE_MS;
const DAY_MS: i64 = 24 * HOUR_MS;
const WEEK_MS: i64 = 7 * DAY_MS;
// Months are approximated as 30 days.
const MONTH_MS: i64 = 30 * DAY_MS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DurationUnit {
    Seconds,
    Minutes,
    Hours,
    Days,
    Weeks,
    Months,
}

impl DurationUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            DurationUnit::Seconds => "SECONDS",
            DurationUnit::Minutes => "MINUTES",
            DurationUnit::Hours => "HOURS",
            DurationUnit::Days => "DAYS",
            DurationUnit::Weeks => "WEEKS",
            DurationUnit::Months => "MONTHS",
        }
    }

    pub fn millis(&self) -> i64 {
        match self {
            DurationUnit::Seconds => SECOND_MS,
            DurationUnit::Minutes => MINUTE_MS,
            DurationUnit::Hours => HOUR_MS,
            DurationUnit::Days => DAY_MS,
            DurationUnit::Weeks => WEEK_MS,
            DurationUnit::Months => MONTH_MS,
        }
    }
}

impl FromStr for DurationUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SECONDS" => Ok(DurationUnit::Seconds),
            "MINUTES" => Ok(DurationUnit::Minutes),
            "HOURS" => Ok(DurationUnit::Hours),
            "DAYS" => Ok(DurationUnit::Days),
            "WEEKS" => Ok(DurationUnit::Weeks),
            "MONTHS" => Ok(DurationUnit::Months),
            other => Err(format!("unknown duration unit: {}", other)),
        }
    }
}

impl fmt::Display for DurationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DurationDescriptor {
    pub size_millis: i64,
    pub size: i64,
    pub unit: DurationUnit,
}

/// Units `describe` may pick, largest first.
const DESCRIBE_UNITS: [DurationUnit; 4] = [
    DurationUnit::Months,
    DurationUnit::Weeks,
    DurationUnit::Days,
    DurationUnit::Hours,
];

/// Largest unit that divides `millis` exactly. Sub-hour and uneven
/// durations have no description.
pub fn describe(millis: i64) -> Option<DurationDescriptor> {
    DESCRIBE_UNITS.iter().find_map(|unit| {
        let size_millis = unit.millis();
        if millis >= size_millis && millis % size_millis == 0 {
            Some(DurationDescriptor {
                size_millis,
                size: millis / size_millis,
                unit: *unit,
            })
        } else {
            None
        }
    })
}

/// `None` for units outside SECONDS..MONTHS.
pub fn to_millis(size: i64, unit: &str) -> Option<i64> {
    let unit: DurationUnit = unit.parse().ok()?;
    size.checked_mul(unit.millis())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_hours() {
        assert_eq!(
            describe(7_200_000),
            Some(DurationDescriptor {
                size_millis: 3_600_000,
                size: 2,
                unit: DurationUnit::Hours
            })
        );
    }

    #[test]
    fn test_describe_prefers_largest_unit() {
        let week = describe(2 * WEEK_MS).unwrap();
        assert_eq!(week.unit, DurationUnit::Weeks);
        assert_eq!(week.size, 2);

        // 30 days is a month, not four-and-a-bit weeks
        let month = describe(2_592_000_000).unwrap();
        assert_eq!(month.unit, DurationUnit::Months);
        assert_eq!(month.size, 1);

        let days = describe(3 * DAY_MS).unwrap();
        assert_eq!(days.unit, DurationUnit::Days);
    }

    #[test]
    fn test_describe_none() {
        assert_eq!(describe(90_000), None);
        assert_eq!(describe(HOUR_MS + 1), None);
        assert_eq!(describe(0), None);
        assert_eq!(describe(-HOUR_MS), None);
    }

    #[test]
    fn test_to_millis() {
        assert_eq!(to_millis(2, "DAYS"), Some(172_800_000));
        assert_eq!(to_millis(3, "SECONDS"), Some(3000));
        assert_eq!(to_millis(1, "MONTHS"), Some(2_592_000_000));
        assert_eq!(to_millis(1, "YEARS"), None);
        assert_eq!(to_millis(1, "days"), None);
    }

    #[test]
    fn test_unit_roundtrip() {
        for unit in ["SECONDS", "MINUTES", "HOURS", "DAYS", "WEEKS", "MONTHS"] {
            let parsed: DurationUnit = unit.parse().unwrap();
            assert_eq!(parsed.as_str(), unit);
        }
    }
}
