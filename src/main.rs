//! Command-line access to the dashboard codecs.
//!
//! Usage:
//!   dashview <command> [args] [options]
//!
//! Commands:
//!   parse-path <path>                   - Parse a dashboard/metric/dimension route
//!   flot <location> [options]           - Build the time-series request for a location
//!   fetch <location> [options]          - Fetch the time series from DASH_BASE_URL
//!   metric-fn <descriptor>              - Parse a metric function descriptor
//!   describe <millis>                   - Describe a duration in the largest exact unit
//!   to-millis <size> <unit>             - Convert a unit+size pair to milliseconds
//!   set-param <hash> <key> <value>      - Upsert one fragment parameter
//!   drill <location> <dimension> <val>  - Apply a drill-down to a location
//!   heatmap <payload.json> [options]    - Lay out a heat-map payload
//!
//! Options:
//!   --window=<millis>    Window size (flot, fetch)
//!   --offset=<millis>    Window offset (flot, fetch)
//!   --dimension=<name>   Break out by dimension (flot, fetch)
//!   --no-legend          Hide the legend (flot, fetch)
//!   --sort=<stat>        Stat to sort by, descending (heatmap)
//!   --alpha=<stat>       Stat that drives cell shading (heatmap)
//!   --display=<stat>     Stat shown in each cell (heatmap)
//!   --columns=<n>        Cells per row (heatmap)

use anyhow::{anyhow, bail, Context, Result};
use serde_json::{json, Value};
use std::fs;
use tokio_util::sync::CancellationToken;

use dashview::config::Config;
use dashview::duration::{describe, to_millis};
use dashview::fetch::{DashboardClient, Series};
use dashview::heatmap::{extract_json, render, DrillDown, RenderOptions, StatKeys};
use dashview::logging::{log, obj, v_str, Domain, Level};
use dashview::metric_function::parse_metric_function;
use dashview::params::set_parameter;
use dashview::timeseries::{build_request, render_time_series, ChartConfig, ChartSink, TimeSeriesOptions};
use dashview::{parse_path, Location};

fn print_usage() {
    eprintln!("Usage: dashview <command> [args] [options]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  parse-path <path>");
    eprintln!("  flot <location> [--window=] [--offset=] [--dimension=] [--no-legend]");
    eprintln!("  fetch <location> [--window=] [--offset=] [--dimension=] [--no-legend]");
    eprintln!("  metric-fn <descriptor>");
    eprintln!("  describe <millis>");
    eprintln!("  to-millis <size> <unit>");
    eprintln!("  set-param <hash> <key> <value>");
    eprintln!("  drill <location> <dimension> <value>");
    eprintln!("  heatmap <payload.json> [--sort=] [--alpha=] [--display=] [--columns=]");
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_num<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.parse()
        .map_err(|_| anyhow!("{} must be a number, got {:?}", name, raw))
}

fn positional<'a>(args: &'a [String], idx: usize, what: &str) -> Result<&'a str> {
    args.get(idx)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("missing {}", what))
}

fn series_options(flags: &[String]) -> Result<TimeSeriesOptions> {
    let mut options = TimeSeriesOptions::default();
    for arg in flags {
        if let Some(v) = arg.strip_prefix("--window=") {
            options.window_millis = Some(parse_num("--window", v)?);
        } else if let Some(v) = arg.strip_prefix("--offset=") {
            options.window_offset_millis = Some(parse_num("--offset", v)?);
        } else if let Some(v) = arg.strip_prefix("--dimension=") {
            options.dimension = Some(v.to_string());
        } else if arg == "--no-legend" {
            options.legend = Some(false);
        }
    }
    Ok(options)
}

fn heat_map_options(flags: &[String], cfg: &Config) -> Result<RenderOptions> {
    let mut sort = "ratio".to_string();
    let mut alpha = None;
    let mut display = None;
    let mut columns = cfg.heat_map_columns;
    for arg in flags {
        if let Some(v) = arg.strip_prefix("--sort=") {
            sort = v.to_string();
        } else if let Some(v) = arg.strip_prefix("--alpha=") {
            alpha = Some(v.to_string());
        } else if let Some(v) = arg.strip_prefix("--display=") {
            display = Some(v.to_string());
        } else if let Some(v) = arg.strip_prefix("--columns=") {
            columns = parse_num("--columns", v)?;
        }
    }
    let keys = StatKeys::new(
        sort.clone(),
        alpha.unwrap_or_else(|| sort.clone()),
        display.unwrap_or(sort),
    );
    Ok(RenderOptions::from_stat_keys(keys).with_columns(columns))
}

/// Writes the fetched series and chart settings to stdout.
struct StdoutSink {
    output: Option<Value>,
}

impl ChartSink for StdoutSink {
    fn render(&mut self, series: &[Series], config: &ChartConfig) {
        let ticks: Vec<Value> = series
            .iter()
            .flat_map(|s| s.data.first())
            .map(|[x, _]| json!({ "millis": *x as i64, "label": config.tick_label(*x as i64) }))
            .collect();
        self.output = Some(json!({
            "config": config,
            "timezone": config.zone.label(),
            "firstTicks": ticks,
            "series": series,
        }));
    }
}

async fn cmd_fetch(location: &str, flags: &[String], cfg: &Config) -> Result<()> {
    let client = DashboardClient::from_config(cfg)?;
    let options = series_options(flags)?;
    let mut sink = StdoutSink { output: None };
    let cancel = CancellationToken::new();

    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let request = render_time_series(
        &client,
        &Location::parse(location),
        &options,
        None,
        cfg.display_zone(),
        &mut sink,
        &cancel,
    )
    .await
    .with_context(|| format!("fetching time series for {}", location))?;

    let output = sink.output.unwrap_or(Value::Null);
    print_json(&json!({ "request": request, "chart": output }))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let cfg = Config::from_env();
    let cmd = args[1].as_str();
    log(
        Level::Debug,
        Domain::System,
        "command",
        obj(&[("command", v_str(cmd)), ("base_url", v_str(&cfg.base_url))]),
    );

    match cmd {
        "parse-path" => {
            let path = parse_path(positional(&args, 2, "path")?)?;
            let function = parse_metric_function(path.metric_function())?;
            print_json(&json!({ "path": path, "metricFunction": function }))
        }
        "flot" => {
            let location = Location::parse(positional(&args, 2, "location")?);
            let request = build_request(&location, &series_options(&args[3..])?)?;
            print_json(&json!(request))
        }
        "fetch" => {
            let location = positional(&args, 2, "location")?.to_string();
            cmd_fetch(&location, &args[3..], &cfg).await
        }
        "metric-fn" => {
            let function = parse_metric_function(positional(&args, 2, "descriptor")?)?;
            let windows: Vec<Value> = function
                .functions
                .iter()
                .map(|f| json!(f.window_millis()))
                .collect();
            print_json(&json!({ "function": function, "windowMillis": windows }))
        }
        "describe" => {
            let millis: i64 = parse_num("millis", positional(&args, 2, "millis")?)?;
            print_json(&json!(describe(millis)))
        }
        "to-millis" => {
            let size: i64 = parse_num("size", positional(&args, 2, "size")?)?;
            let unit = positional(&args, 3, "unit")?;
            match to_millis(size, unit) {
                Some(millis) => print_json(&json!(millis)),
                None => bail!("unknown unit {:?}", unit),
            }
        }
        "set-param" => {
            let hash = positional(&args, 2, "hash")?;
            let key = positional(&args, 3, "key")?;
            let value = positional(&args, 4, "value")?;
            println!("{}", set_parameter(hash, key, value));
            Ok(())
        }
        "drill" => {
            let location = Location::parse(positional(&args, 2, "location")?);
            let dimension = positional(&args, 3, "dimension")?;
            let value = positional(&args, 4, "value")?;
            let target = DrillDown {
                dimension: dimension.to_string(),
                value: value.to_string(),
            };
            println!("{}", target.apply(&location).href());
            Ok(())
        }
        "heatmap" => {
            let file = positional(&args, 2, "payload file")?;
            let raw = fs::read_to_string(file).with_context(|| format!("reading {}", file))?;
            let dataset = extract_json(&raw)?;
            let options = heat_map_options(&args[3..], &cfg)?;
            print_json(&json!(render(dataset, &options)))
        }
        other => {
            eprintln!("Unknown command: {}", other);
            print_usage();
            std::process::exit(1);
        }
    }
}
