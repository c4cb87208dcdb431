//! Dashboard route grammar.
//!
//! Routes are slash-delimited with the kind at token 1:
//!
//! ```text
//! /dashboard/{collection}/{metricFunction}/{metricViewType}/{dimensionViewType}/{baseline}/{current}
//! /metric/{collection}/{metricFunction}/{metricViewType}/{baseline}/{current}
//! /dimension/{collection}/{metricFunction}/{dimensionViewType}/{baseline}/{current}
//! ```
//!
//! Token counts are exact: a short route fails with `MissingPathComponent`,
//! a long one with `UnexpectedPathComponent`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{DashError, Result};
use crate::logging::{log, obj, v_str, Domain, Level};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathKind {
    Dashboard,
    Metric,
    Dimension,
}

impl PathKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PathKind::Dashboard => "dashboard",
            PathKind::Metric => "metric",
            PathKind::Dimension => "dimension",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "dashboard" => Some(PathKind::Dashboard),
            "metric" => Some(PathKind::Metric),
            "dimension" => Some(PathKind::Dimension),
            _ => None,
        }
    }
}

impl fmt::Display for PathKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed navigation state. Only the view types belonging to `kind` are set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationPath {
    kind: PathKind,
    collection: String,
    metric_function: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    metric_view_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimension_view_type: Option<String>,
    baseline_millis: i64,
    current_millis: i64,
}

impl NavigationPath {
    pub fn dashboard(
        collection: impl Into<String>,
        metric_function: impl Into<String>,
        metric_view_type: impl Into<String>,
        dimension_view_type: impl Into<String>,
        baseline_millis: i64,
        current_millis: i64,
    ) -> Self {
        Self {
            kind: PathKind::Dashboard,
            collection: collection.into(),
            metric_function: metric_function.into(),
            metric_view_type: Some(metric_view_type.into()),
            dimension_view_type: Some(dimension_view_type.into()),
            baseline_millis,
            current_millis,
        }
    }

    pub fn metric(
        collection: impl Into<String>,
        metric_function: impl Into<String>,
        metric_view_type: impl Into<String>,
        baseline_millis: i64,
        current_millis: i64,
    ) -> Self {
        Self {
            kind: PathKind::Metric,
            collection: collection.into(),
            metric_function: metric_function.into(),
            metric_view_type: Some(metric_view_type.into()),
            dimension_view_type: None,
            baseline_millis,
            current_millis,
        }
    }

    pub fn dimension(
        collection: impl Into<String>,
        metric_function: impl Into<String>,
        dimension_view_type: impl Into<String>,
        baseline_millis: i64,
        current_millis: i64,
    ) -> Self {
        Self {
            kind: PathKind::Dimension,
            collection: collection.into(),
            metric_function: metric_function.into(),
            metric_view_type: None,
            dimension_view_type: Some(dimension_view_type.into()),
            baseline_millis,
            current_millis,
        }
    }

    pub fn kind(&self) -> PathKind {
        self.kind
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn metric_function(&self) -> &str {
        &self.metric_function
    }

    pub fn metric_view_type(&self) -> Option<&str> {
        self.metric_view_type.as_deref()
    }

    pub fn dimension_view_type(&self) -> Option<&str> {
        self.dimension_view_type.as_deref()
    }

    pub fn baseline_millis(&self) -> i64 {
        self.baseline_millis
    }

    pub fn current_millis(&self) -> i64 {
        self.current_millis
    }

    /// Span between baseline and current, saturating at the i64 bounds.
    pub fn window_millis(&self) -> i64 {
        self.current_millis.saturating_sub(self.baseline_millis)
    }
}

/// Renders the route for the path's own kind, so every kind round-trips
/// through `parse_path`.
impl fmt::Display for NavigationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}/{}", self.kind, self.collection, self.metric_function)?;
        if let Some(view) = &self.metric_view_type {
            write!(f, "/{}", view)?;
        }
        if let Some(view) = &self.dimension_view_type {
            write!(f, "/{}", view)?;
        }
        write!(f, "/{}/{}", self.baseline_millis, self.current_millis)
    }
}

struct TokenCursor<'a> {
    kind: PathKind,
    tokens: &'a [&'a str],
    position: usize,
}

impl<'a> TokenCursor<'a> {
    fn next(&mut self, component: &'static str) -> Result<&'a str> {
        let position = self.position;
        self.position += 1;
        match self.tokens.get(position) {
            Some(token) if !token.is_empty() => Ok(*token),
            _ => Err(DashError::MissingPathComponent {
                kind: self.kind,
                position,
                component,
            }),
        }
    }

    fn next_millis(&mut self, component: &'static str) -> Result<i64> {
        let token = self.next(component)?;
        let invalid = || DashError::InvalidMillis {
            component,
            value: token.to_string(),
        };
        let millis: i64 = token.parse().map_err(|_| invalid())?;
        // only the canonical spelling, so the route re-renders byte for byte
        if millis.to_string() != token {
            return Err(invalid());
        }
        Ok(millis)
    }

    fn finish(self) -> Result<()> {
        match self.tokens.get(self.position) {
            None => Ok(()),
            Some(extra) => Err(DashError::UnexpectedPathComponent {
                kind: self.kind,
                position: self.position,
                value: extra.to_string(),
            }),
        }
    }
}

pub fn parse_path(raw: &str) -> Result<NavigationPath> {
    let tokens: Vec<&str> = raw.split('/').collect();
    let kind_token = tokens.get(1).copied().unwrap_or_default();
    let kind = PathKind::from_token(kind_token).ok_or_else(|| {
        log(
            Level::Warn,
            Domain::Path,
            "unrecognized_kind",
            obj(&[("path", v_str(raw)), ("kind", v_str(kind_token))]),
        );
        DashError::UnrecognizedPathKind(kind_token.to_string())
    })?;

    let mut cursor = TokenCursor {
        kind,
        tokens: &tokens,
        position: 2,
    };
    let collection = cursor.next("collection")?.to_string();
    let metric_function = cursor.next("metricFunction")?.to_string();
    let (metric_view_type, dimension_view_type) = match kind {
        PathKind::Dashboard => (
            Some(cursor.next("metricViewType")?.to_string()),
            Some(cursor.next("dimensionViewType")?.to_string()),
        ),
        PathKind::Metric => (Some(cursor.next("metricViewType")?.to_string()), None),
        PathKind::Dimension => (None, Some(cursor.next("dimensionViewType")?.to_string())),
    };
    let baseline_millis = cursor.next_millis("baselineMillis")?;
    let current_millis = cursor.next_millis("currentMillis")?;
    cursor.finish()?;

    Ok(NavigationPath {
        kind,
        collection,
        metric_function,
        metric_view_type,
        dimension_view_type,
        baseline_millis,
        current_millis,
    })
}

/// Serializes to the dashboard route regardless of `path.kind()`.
pub fn serialize_path(path: &NavigationPath) -> Result<String> {
    let metric_view_type = path.metric_view_type().ok_or(DashError::MissingPathComponent {
        kind: PathKind::Dashboard,
        position: 4,
        component: "metricViewType",
    })?;
    let dimension_view_type = path.dimension_view_type().ok_or(DashError::MissingPathComponent {
        kind: PathKind::Dashboard,
        position: 5,
        component: "dimensionViewType",
    })?;
    Ok(format!(
        "/dashboard/{}/{}/{}/{}/{}/{}",
        path.collection,
        path.metric_function,
        metric_view_type,
        dimension_view_type,
        path.baseline_millis,
        path.current_millis
    ))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlotOptions {
    pub window_millis: Option<i64>,
    pub window_offset_millis: Option<i64>,
}

pub fn flot_view_type(metric_view_type: &str) -> &str {
    if metric_view_type == "INTRA_DAY" {
        "TIME_SERIES_FULL"
    } else {
        metric_view_type
    }
}

/// Request path for the time series behind `path`. Needs a metric view type,
/// so dimension routes are rejected.
pub fn to_flot_path(path: &NavigationPath, options: &FlotOptions) -> Result<String> {
    let view_type = path
        .metric_view_type()
        .ok_or(DashError::MissingPathComponent {
            kind: path.kind,
            position: 4,
            component: "metricViewType",
        })?;

    let mut flot = format!(
        "/flot/{}/{}/{}/{}/{}",
        flot_view_type(view_type),
        path.collection,
        path.metric_function,
        path.baseline_millis,
        path.current_millis
    );
    if let Some(window) = options.window_millis {
        flot.push_str(&format!("/{}", window));
    }
    if let Some(offset) = options.window_offset_millis {
        flot.push_str(&format!("/{}", offset));
    }
    Ok(flot)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DASHBOARD: &str = "/dashboard/abook/AGGREGATE_1_HOURS(m1,m2)/INTRA_DAY/HEAT_MAP/1000/2000";

    #[test]
    fn test_parse_dashboard() {
        let path = parse_path(DASHBOARD).unwrap();
        assert_eq!(path.kind(), PathKind::Dashboard);
        assert_eq!(path.collection(), "abook");
        assert_eq!(path.metric_function(), "AGGREGATE_1_HOURS(m1,m2)");
        assert_eq!(path.metric_view_type(), Some("INTRA_DAY"));
        assert_eq!(path.dimension_view_type(), Some("HEAT_MAP"));
        assert_eq!(path.baseline_millis(), 1000);
        assert_eq!(path.current_millis(), 2000);
    }

    #[test]
    fn test_dashboard_roundtrip() {
        let path = parse_path(DASHBOARD).unwrap();
        assert_eq!(serialize_path(&path).unwrap(), DASHBOARD);
        assert_eq!(path.to_string(), DASHBOARD);
    }

    #[test]
    fn test_metric_roundtrip() {
        let path = parse_path("/metric/x/y/z/1/2").unwrap();
        assert_eq!(path.kind(), PathKind::Metric);
        assert_eq!(path.collection(), "x");
        assert_eq!(path.metric_function(), "y");
        assert_eq!(path.metric_view_type(), Some("z"));
        assert_eq!(path.dimension_view_type(), None);
        assert_eq!(path.baseline_millis(), 1);
        assert_eq!(path.current_millis(), 2);
        assert_eq!(path.to_string(), "/metric/x/y/z/1/2");
    }

    #[test]
    fn test_dimension_kind() {
        let path = parse_path("/dimension/x/y/TABULAR/1/2").unwrap();
        assert_eq!(path.metric_view_type(), None);
        assert_eq!(path.dimension_view_type(), Some("TABULAR"));
        assert_eq!(path.to_string(), "/dimension/x/y/TABULAR/1/2");
        assert!(matches!(
            serialize_path(&path),
            Err(DashError::MissingPathComponent { component: "metricViewType", .. })
        ));
    }

    #[test]
    fn test_unrecognized_kind() {
        let err = parse_path("/flot/x/y/z/1/2").unwrap_err();
        assert!(matches!(err, DashError::UnrecognizedPathKind(ref k) if k == "flot"));
        assert!(matches!(parse_path(""), Err(DashError::UnrecognizedPathKind(_))));
    }

    #[test]
    fn test_short_path_is_missing_component() {
        let err = parse_path("/metric/x/y/z/1").unwrap_err();
        assert!(matches!(
            err,
            DashError::MissingPathComponent { kind: PathKind::Metric, position: 6, component: "currentMillis" }
        ));
        let err = parse_path("/dashboard/x//z/w/1/2").unwrap_err();
        assert!(matches!(
            err,
            DashError::MissingPathComponent { component: "metricFunction", .. }
        ));
    }

    #[test]
    fn test_long_path_is_rejected() {
        let err = parse_path("/metric/x/y/z/1/2/3").unwrap_err();
        assert!(matches!(
            err,
            DashError::UnexpectedPathComponent { position: 7, ref value, .. } if value == "3"
        ));
        assert!(parse_path("/metric/x/y/z/1/2/").is_err());
    }

    #[test]
    fn test_non_numeric_millis() {
        let err = parse_path("/metric/x/y/z/yesterday/2").unwrap_err();
        assert!(matches!(err, DashError::InvalidMillis { component: "baselineMillis", .. }));
    }

    #[test]
    fn test_non_canonical_millis() {
        for raw in ["/metric/x/y/z/0100/200", "/metric/x/y/z/100/+200", "/metric/x/y/z/-0/200"] {
            assert!(
                matches!(parse_path(raw), Err(DashError::InvalidMillis { .. })),
                "{}",
                raw
            );
        }
        let raw = "/metric/x/y/z/-100/0";
        assert_eq!(parse_path(raw).unwrap().to_string(), raw);
    }

    #[test]
    fn test_window_millis_saturates() {
        let path = parse_path("/metric/x/y/z/-9223372036854775808/1").unwrap();
        assert_eq!(path.window_millis(), i64::MAX);
        let path = parse_path("/metric/x/y/z/9223372036854775807/-2").unwrap();
        assert_eq!(path.window_millis(), i64::MIN);
    }

    #[test]
    fn test_flot_path_intra_day() {
        let path = NavigationPath::metric("c", "m", "INTRA_DAY", 100, 200);
        let options = FlotOptions {
            window_millis: Some(50),
            window_offset_millis: None,
        };
        assert_eq!(
            to_flot_path(&path, &options).unwrap(),
            "/flot/TIME_SERIES_FULL/c/m/100/200/50"
        );
    }

    #[test]
    fn test_flot_path_passthrough_and_offset() {
        let path = NavigationPath::dashboard("c", "m", "TIME_SERIES_OVERLAY", "HEAT_MAP", 100, 200);
        assert_eq!(
            to_flot_path(&path, &FlotOptions::default()).unwrap(),
            "/flot/TIME_SERIES_OVERLAY/c/m/100/200"
        );
        let options = FlotOptions {
            window_millis: Some(50),
            window_offset_millis: Some(7),
        };
        assert_eq!(
            to_flot_path(&path, &options).unwrap(),
            "/flot/TIME_SERIES_OVERLAY/c/m/100/200/50/7"
        );
    }

    #[test]
    fn test_flot_path_needs_metric_view() {
        let path = NavigationPath::dimension("c", "m", "HEAT_MAP", 1, 2);
        assert!(to_flot_path(&path, &FlotOptions::default()).is_err());
    }
}
