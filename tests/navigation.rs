//! End-to-end checks of the navigation codecs: route parsing, query
//! round-trips, drill-down and time-series request building.

use dashview::duration::{describe, to_millis, DurationUnit};
use dashview::heatmap::DrillDown;
use dashview::metric_function::parse_metric_function;
use dashview::params::{set_parameter, ParamMarker, ParameterSet};
use dashview::timeseries::{build_request, TimeSeriesOptions};
use dashview::{
    parse_path, serialize_path, to_flot_path, DashError, FlotOptions, HistoryNavigator, Location,
    NavigationPath, Navigator, PathKind,
};

const ROUTES: &[&str] = &[
    "/dashboard/abook/AGGREGATE_1_HOURS(pageViews)/INTRA_DAY/HEAT_MAP/1410000000000/1410086400000",
    "/dashboard/abook/MOVING_AVERAGE_7_DAYS(AGGREGATE_1_HOURS(a,b))/TIME_SERIES_OVERLAY/TABULAR/0/1",
    "/metric/x/y/z/1/2",
    "/dimension/abook/AGGREGATE_1_DAYS(m)/MULTI_TIME_SERIES/100/200",
];

#[test]
fn routes_roundtrip() {
    for route in ROUTES {
        let path = parse_path(route).unwrap_or_else(|e| panic!("{}: {}", route, e));
        assert_eq!(&path.to_string(), route);
        if path.kind() == PathKind::Dashboard {
            assert_eq!(&serialize_path(&path).unwrap(), route);
        }
    }
}

#[test]
fn route_metric_function_parses() {
    let path = parse_path(ROUTES[1]).unwrap();
    let function = parse_metric_function(path.metric_function()).unwrap();
    assert_eq!(function.functions.len(), 2);
    assert_eq!(function.functions[0].window_millis(), Some(7 * 86_400_000));
    assert_eq!(function.metrics, vec!["a", "b"]);
}

#[test]
fn arity_is_enforced_per_kind() {
    // dimension layout given to a dashboard route
    assert!(matches!(
        parse_path("/dashboard/x/y/z/1/2"),
        Err(DashError::MissingPathComponent { kind: PathKind::Dashboard, .. })
    ));
    // dashboard layout given to a metric route
    assert!(matches!(
        parse_path("/metric/x/y/z/w/1/2"),
        Err(DashError::InvalidMillis { .. }) | Err(DashError::UnexpectedPathComponent { .. })
    ));
    assert!(matches!(
        parse_path("/dimension/x/y/z/1/2/3"),
        Err(DashError::UnexpectedPathComponent { .. })
    ));
}

#[test]
fn flot_path_property() {
    let path = NavigationPath::metric("c", "m", "INTRA_DAY", 100, 200);
    let options = FlotOptions {
        window_millis: Some(50),
        ..Default::default()
    };
    assert_eq!(
        to_flot_path(&path, &options).unwrap(),
        "/flot/TIME_SERIES_FULL/c/m/100/200/50"
    );
}

#[test]
fn parameter_sets_roundtrip() {
    let sets: Vec<ParameterSet> = vec![
        ParameterSet::new(),
        [("a", "1")].into_iter().collect(),
        [("country", "us"), ("browser", "chrome & firefox"), ("q", "x=y")]
            .into_iter()
            .collect(),
        [("%", "%%"), ("tab", "\t"), ("emoji", "📈"), ("plus", "a+b")]
            .into_iter()
            .collect(),
    ];
    for set in &sets {
        assert_eq!(&ParameterSet::decode(&set.encode(ParamMarker::Fragment)), set);
        assert_eq!(&ParameterSet::decode(&set.encode(ParamMarker::Query)), set);
    }
}

#[test]
fn hash_upsert_preserves_other_keys() {
    let hash = set_parameter("#view=heat&tab=2", "tab", "3");
    let params = ParameterSet::decode(&hash);
    assert_eq!(params.get("view"), Some("heat"));
    assert_eq!(params.get("tab"), Some("3"));
}

#[test]
fn durations() {
    let d = describe(7_200_000).unwrap();
    assert_eq!((d.size_millis, d.size, d.unit), (3_600_000, 2, DurationUnit::Hours));
    assert!(describe(90_000).is_none());
    assert_eq!(to_millis(2, "DAYS"), Some(172_800_000));
}

#[test]
fn drill_down_then_request() {
    let start = Location::parse(
        "/dashboard/abook/AGGREGATE_1_HOURS(pageViews)/INTRA_DAY/HEAT_MAP/1000/2000",
    );
    let mut nav = HistoryNavigator::new(start);

    DrillDown {
        dimension: "country".to_string(),
        value: "us".to_string(),
    }
    .activate(&mut nav);
    assert_eq!(nav.location().search(), "?country=us");

    let options = TimeSeriesOptions {
        dimension: Some("browser".to_string()),
        ..Default::default()
    };
    let request = build_request(nav.location(), &options).unwrap();
    assert_eq!(
        request.url,
        "/flot/TIME_SERIES_FULL/abook/AGGREGATE_1_HOURS(pageViews)/1000/2000?country=us&browser=!"
    );
    assert_eq!(request.tick_interval_millis, 100);

    nav.back();
    assert_eq!(nav.location().search(), "");
}
