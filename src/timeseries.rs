//! Time-series request composition and the chart sink boundary.

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::fetch::{DataSource, Series};
use crate::format::DisplayZone;
use crate::heatmap::WILDCARD;
use crate::location::Location;
use crate::logging::{log, obj, v_num, v_str, Domain, Level};
use crate::path::{to_flot_path, FlotOptions};

/// Number of ticks the x axis is divided into.
const TICKS_PER_WINDOW: i64 = 10;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeSeriesOptions {
    pub window_millis: Option<i64>,
    pub window_offset_millis: Option<i64>,
    /// Dimension to break the series out by (requested as `{dimension}=!`).
    pub dimension: Option<String>,
    /// `None` shows the legend.
    pub legend: Option<bool>,
}

impl TimeSeriesOptions {
    fn flot(&self) -> FlotOptions {
        FlotOptions {
            window_millis: self.window_millis,
            window_offset_millis: self.window_offset_millis,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesRequest {
    pub url: String,
    pub tick_interval_millis: i64,
    pub show_legend: bool,
}

pub fn build_request(location: &Location, options: &TimeSeriesOptions) -> Result<TimeSeriesRequest> {
    let path = location.navigation_path()?;
    let mut url = to_flot_path(&path, &options.flot())?;

    let search = location.search();
    url.push_str(search);
    if let Some(dimension) = &options.dimension {
        url.push(if search.is_empty() { '?' } else { '&' });
        url.push_str(&urlencoding::encode(dimension));
        url.push('=');
        url.push_str(WILDCARD);
    }

    Ok(TimeSeriesRequest {
        url,
        tick_interval_millis: path.window_millis() / TICKS_PER_WINDOW,
        show_legend: options.legend.unwrap_or(true),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartConfig {
    pub show_legend: bool,
    pub legend_position: &'static str,
    pub clickable: bool,
    pub hoverable: bool,
    pub min_tick_size_millis: i64,
    #[serde(skip)]
    pub zone: DisplayZone,
}

impl ChartConfig {
    pub fn for_request(request: &TimeSeriesRequest, zone: DisplayZone) -> Self {
        Self {
            show_legend: request.show_legend,
            legend_position: "se",
            clickable: true,
            hoverable: true,
            min_tick_size_millis: request.tick_interval_millis,
            zone,
        }
    }

    pub fn tick_label(&self, millis: i64) -> String {
        self.zone.tick_label(millis)
    }

    /// Tooltip for the `point`-th datapoint of `series`.
    pub fn hover_text(&self, series: &Series, point: usize) -> Option<String> {
        let [x, y] = series.data.get(point)?;
        Some(self.zone.tooltip_text(&series.label, *y, *x as i64))
    }
}

/// Receives fetched series. Hover and click handling belong to the sink.
pub trait ChartSink {
    fn render(&mut self, series: &[Series], config: &ChartConfig);
}

pub type SeriesFilter = dyn Fn(Vec<Series>) -> Vec<Series> + Send + Sync;

/// Fetches the series for `location` and hands them to `sink`. The sink is
/// not called when the fetch fails or is cancelled.
pub async fn render_time_series<S, K>(
    source: &S,
    location: &Location,
    options: &TimeSeriesOptions,
    filter: Option<&SeriesFilter>,
    zone: DisplayZone,
    sink: &mut K,
    cancel: &CancellationToken,
) -> Result<TimeSeriesRequest>
where
    S: DataSource + ?Sized,
    K: ChartSink,
{
    let request = build_request(location, options)?;
    let mut series = source.fetch_series(&request.url, cancel).await?;
    if let Some(filter) = filter {
        series = filter(series);
    }

    log(
        Level::Debug,
        Domain::Fetch,
        "render_time_series",
        obj(&[
            ("url", v_str(&request.url)),
            ("series", v_num(series.len() as f64)),
        ]),
    );

    let config = ChartConfig::for_request(&request, zone);
    sink.render(&series, &config);
    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DashError;
    use async_trait::async_trait;

    const DASHBOARD: &str = "/dashboard/c/m/INTRA_DAY/HEAT_MAP/1000/2000";

    #[test]
    fn test_request_without_query() {
        let req = build_request(&Location::parse(DASHBOARD), &TimeSeriesOptions::default()).unwrap();
        assert_eq!(req.url, "/flot/TIME_SERIES_FULL/c/m/1000/2000");
        assert_eq!(req.tick_interval_millis, 100);
        assert!(req.show_legend);
    }

    #[test]
    fn test_request_keeps_query_verbatim() {
        let loc = Location::parse(&format!("{}?country=us&browser=a%20b", DASHBOARD));
        let options = TimeSeriesOptions {
            window_millis: Some(3_600_000),
            legend: Some(false),
            ..Default::default()
        };
        let req = build_request(&loc, &options).unwrap();
        assert_eq!(
            req.url,
            "/flot/TIME_SERIES_FULL/c/m/1000/2000/3600000?country=us&browser=a%20b"
        );
        assert!(!req.show_legend);
    }

    #[test]
    fn test_request_dimension_wildcard() {
        let options = TimeSeriesOptions {
            dimension: Some("country".to_string()),
            ..Default::default()
        };
        let fresh = build_request(&Location::parse(DASHBOARD), &options).unwrap();
        assert!(fresh.url.ends_with("/2000?country=!"));

        let loc = Location::parse(&format!("{}?browser=chrome", DASHBOARD));
        let joined = build_request(&loc, &options).unwrap();
        assert!(joined.url.ends_with("/2000?browser=chrome&country=!"));
    }

    #[test]
    fn test_request_rejects_bad_location() {
        let err = build_request(&Location::parse("/flot/x"), &TimeSeriesOptions::default()).unwrap_err();
        assert!(matches!(err, DashError::UnrecognizedPathKind(_)));
    }

    #[test]
    fn test_request_extreme_millis() {
        let loc = Location::parse("/metric/x/y/z/-9223372036854775808/1");
        let req = build_request(&loc, &TimeSeriesOptions::default()).unwrap();
        assert_eq!(req.url, "/flot/z/x/y/-9223372036854775808/1");
        assert_eq!(req.tick_interval_millis, i64::MAX / 10);
    }

    #[test]
    fn test_hover_text() {
        let req = build_request(&Location::parse(DASHBOARD), &TimeSeriesOptions::default()).unwrap();
        let config = ChartConfig::for_request(&req, DisplayZone::utc());
        let series = Series {
            label: "m".to_string(),
            data: vec![[0.0, 4.0]],
        };
        assert_eq!(
            config.hover_text(&series, 0).as_deref(),
            Some("m = 4 @ 1970-01-01T00:00:00+00:00")
        );
        assert_eq!(config.hover_text(&series, 1), None);
        assert_eq!(config.legend_position, "se");
    }

    struct Canned(&'static str);

    #[async_trait]
    impl DataSource for Canned {
        async fn get_text(&self, url: &str, cancel: &CancellationToken) -> Result<String> {
            if cancel.is_cancelled() {
                return Err(DashError::Cancelled { url: url.to_string() });
            }
            Ok(self.0.to_string())
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        calls: Vec<(Vec<Series>, ChartConfig)>,
    }

    impl ChartSink for RecordingSink {
        fn render(&mut self, series: &[Series], config: &ChartConfig) {
            self.calls.push((series.to_vec(), config.clone()));
        }
    }

    #[tokio::test]
    async fn test_render_applies_filter() {
        let source = Canned(r#"[{"label":"a","data":[[1,1]]},{"label":"b","data":[]}]"#);
        let mut sink = RecordingSink::default();
        let keep_non_empty = |s: Vec<Series>| -> Vec<Series> {
            s.into_iter().filter(|x| !x.data.is_empty()).collect()
        };
        render_time_series(
            &source,
            &Location::parse(DASHBOARD),
            &TimeSeriesOptions::default(),
            Some(&keep_non_empty as &SeriesFilter),
            DisplayZone::utc(),
            &mut sink,
            &CancellationToken::new(),
        )
        .await
        .unwrap();
        assert_eq!(sink.calls.len(), 1);
        assert_eq!(sink.calls[0].0.len(), 1);
        assert_eq!(sink.calls[0].0[0].label, "a");
        assert_eq!(sink.calls[0].1.min_tick_size_millis, 100);
    }

    #[tokio::test]
    async fn test_render_skips_sink_on_failure() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut sink = RecordingSink::default();
        let result = render_time_series(
            &Canned("[]"),
            &Location::parse(DASHBOARD),
            &TimeSeriesOptions::default(),
            None,
            DisplayZone::utc(),
            &mut sink,
            &cancel,
        )
        .await;
        assert!(matches!(result, Err(DashError::Cancelled { .. })));
        assert!(sink.calls.is_empty());
    }
}
