//! Dashboard navigation: route and query codecs, heat-map layout and
//! time-series request building.

pub mod config;
pub mod duration;
pub mod error;
pub mod fetch;
pub mod format;
pub mod heatmap;
pub mod location;
pub mod logging;
pub mod metric_function;
pub mod params;
pub mod path;
pub mod timeseries;

pub use error::{DashError, Result};
pub use location::{HistoryNavigator, Location, Navigator};
pub use path::{parse_path, serialize_path, to_flot_path, FlotOptions, NavigationPath, PathKind};
