use std::time::Duration;

use crate::format::DisplayZone;
use crate::heatmap::DEFAULT_COLUMNS;

const DEFAULT_BASE_URL: &str = "http://localhost:8080/";

#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub fetch_timeout: Duration,
    pub fetch_retries: u32,
    pub heat_map_columns: usize,
    pub tz_offset_minutes: i32,
    pub tz_name: String,
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            fetch_timeout: Duration::from_millis(10_000),
            fetch_retries: 2,
            heat_map_columns: DEFAULT_COLUMNS,
            tz_offset_minutes: 0,
            tz_name: "UTC".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("DASH_BASE_URL").unwrap_or(defaults.base_url),
            fetch_timeout: env_parse::<u64>("DASH_FETCH_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.fetch_timeout),
            fetch_retries: env_parse("DASH_FETCH_RETRIES").unwrap_or(defaults.fetch_retries),
            heat_map_columns: env_parse::<usize>("DASH_HEAT_MAP_COLUMNS")
                .filter(|c| *c > 0)
                .unwrap_or(defaults.heat_map_columns),
            tz_offset_minutes: env_parse("DASH_TZ_OFFSET_MINUTES").unwrap_or(defaults.tz_offset_minutes),
            tz_name: std::env::var("DASH_TZ_NAME").unwrap_or(defaults.tz_name),
        }
    }

    pub fn display_zone(&self) -> DisplayZone {
        DisplayZone::from_offset_minutes(self.tz_offset_minutes, self.tz_name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.base_url, "http://localhost:8080/");
        assert_eq!(cfg.fetch_timeout, Duration::from_secs(10));
        assert_eq!(cfg.heat_map_columns, 5);
        assert_eq!(cfg.display_zone().label(), "00:00 UTC");
    }
}
