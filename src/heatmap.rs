//! Heat-map extraction and grid layout.
//!
//! A payload carries one block per (metric, dimension) pair. Each block names
//! its stats once and every cell lists stat values positionally against those
//! names. `extract` turns that into named stats per cell, and `render` sorts,
//! filters and packs the cells into fixed-width rows with a drill-down target
//! per cell.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use std::fmt;

use crate::error::{DashError, Result};
use crate::location::{Location, Navigator};
use crate::logging::{log, obj, v_num, v_str, Domain, Level, ProfileScope};

pub const DEFAULT_COLUMNS: usize = 5;

/// Query value meaning "any value" for a dimension.
pub const WILDCARD: &str = "!";

// =============================================================================
// Raw payload schema
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawHeatMapPayload {
    pub heat_maps: Vec<RawHeatMapBlock>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawHeatMapBlock {
    pub metric: String,
    pub dimension: String,
    pub stats_names: Vec<String>,
    #[serde(default)]
    pub cells: Vec<RawHeatMapCell>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawHeatMapCell {
    pub value: String,
    pub stats: Vec<Value>,
}

// =============================================================================
// Dataset
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct HeatMapId {
    pub metric: String,
    pub dimension: String,
}

impl HeatMapId {
    pub fn new(metric: impl Into<String>, dimension: impl Into<String>) -> Self {
        Self {
            metric: metric.into(),
            dimension: dimension.into(),
        }
    }

    pub fn caption(&self) -> String {
        format!("{}.{}", self.metric, self.dimension)
    }
}

impl fmt::Display for HeatMapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.metric, self.dimension)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatMapCell {
    pub value: String,
    pub stats: BTreeMap<String, f64>,
}

impl HeatMapCell {
    pub fn stat(&self, name: &str) -> Option<f64> {
        self.stats.get(name).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatMap {
    pub id: HeatMapId,
    pub cells: Vec<HeatMapCell>,
}

/// Heat maps in payload order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HeatMapDataset {
    heat_maps: Vec<HeatMap>,
}

impl HeatMapDataset {
    pub fn get(&self, id: &HeatMapId) -> Option<&HeatMap> {
        self.heat_maps.iter().find(|h| &h.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &HeatMap> {
        self.heat_maps.iter()
    }

    pub fn len(&self) -> usize {
        self.heat_maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heat_maps.is_empty()
    }

    /// A repeated id replaces the earlier heat map's cells.
    fn insert(&mut self, heat_map: HeatMap) {
        match self.heat_maps.iter_mut().find(|h| h.id == heat_map.id) {
            Some(existing) => {
                log(
                    Level::Warn,
                    Domain::HeatMap,
                    "duplicate_heat_map",
                    obj(&[("id", v_str(&heat_map.id.to_string()))]),
                );
                existing.cells = heat_map.cells;
            }
            None => self.heat_maps.push(heat_map),
        }
    }
}

impl IntoIterator for HeatMapDataset {
    type Item = HeatMap;
    type IntoIter = std::vec::IntoIter<HeatMap>;

    fn into_iter(self) -> Self::IntoIter {
        self.heat_maps.into_iter()
    }
}

fn extract_block(block: &RawHeatMapBlock) -> Result<HeatMap> {
    let id = HeatMapId::new(&block.metric, &block.dimension);

    let mut seen = HashSet::new();
    for name in &block.stats_names {
        if !seen.insert(name.as_str()) {
            return Err(DashError::MalformedPayload(format!(
                "heat map {} names stat {:?} twice",
                id, name
            )));
        }
    }

    let mut cells = Vec::with_capacity(block.cells.len());
    for raw in &block.cells {
        if raw.stats.len() != block.stats_names.len() {
            return Err(DashError::MalformedPayload(format!(
                "cell {:?} in heat map {} has {} stats, expected {}",
                raw.value,
                id,
                raw.stats.len(),
                block.stats_names.len()
            )));
        }
        let mut stats = BTreeMap::new();
        for (name, value) in block.stats_names.iter().zip(&raw.stats) {
            let number = value.as_f64().ok_or_else(|| {
                DashError::MalformedPayload(format!(
                    "stat {:?} of cell {:?} in heat map {} is not a number: {}",
                    name, raw.value, id, value
                ))
            })?;
            stats.insert(name.clone(), number);
        }
        cells.push(HeatMapCell {
            value: raw.value.clone(),
            stats,
        });
    }

    Ok(HeatMap { id, cells })
}

pub fn extract(payload: &RawHeatMapPayload) -> Result<HeatMapDataset> {
    let mut dataset = HeatMapDataset::default();
    for block in &payload.heat_maps {
        dataset.insert(extract_block(block)?);
    }
    log(
        Level::Debug,
        Domain::HeatMap,
        "extracted",
        obj(&[("heat_maps", v_num(dataset.len() as f64))]),
    );
    Ok(dataset)
}

pub fn extract_json(raw: &str) -> Result<HeatMapDataset> {
    let payload: RawHeatMapPayload =
        serde_json::from_str(raw).map_err(|e| DashError::MalformedPayload(e.to_string()))?;
    extract(&payload)
}

// =============================================================================
// Drill-down
// =============================================================================

/// Query parameter a cell click merges into the current location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrillDown {
    pub dimension: String,
    pub value: String,
}

impl DrillDown {
    pub fn wildcard(dimension: impl Into<String>) -> Self {
        Self {
            dimension: dimension.into(),
            value: WILDCARD.to_string(),
        }
    }

    pub fn apply(&self, location: &Location) -> Location {
        location.with_query_parameter(&self.dimension, &self.value)
    }

    pub fn activate<N: Navigator>(&self, navigator: &mut N) {
        let next = self.apply(navigator.location());
        navigator.navigate(next);
    }
}

// =============================================================================
// Rendering
// =============================================================================

pub type CellComparator = Box<dyn Fn(&HeatMapCell, &HeatMapCell) -> Ordering>;
pub type CellPredicate = Box<dyn Fn(&HeatMapCell) -> bool>;
pub type CellFormatter = Box<dyn Fn(&HeatMapCell) -> String>;

pub struct RenderOptions {
    pub comparator: CellComparator,
    pub filter: Option<CellPredicate>,
    pub display: CellFormatter,
    pub background_color: CellFormatter,
    pub columns: usize,
}

impl RenderOptions {
    pub fn new(
        comparator: impl Fn(&HeatMapCell, &HeatMapCell) -> Ordering + 'static,
        display: impl Fn(&HeatMapCell) -> String + 'static,
        background_color: impl Fn(&HeatMapCell) -> String + 'static,
    ) -> Self {
        Self {
            comparator: Box::new(comparator),
            filter: None,
            display: Box::new(display),
            background_color: Box::new(background_color),
            columns: DEFAULT_COLUMNS,
        }
    }

    pub fn with_filter(mut self, filter: impl Fn(&HeatMapCell) -> bool + 'static) -> Self {
        self.filter = Some(Box::new(filter));
        self
    }

    pub fn with_columns(mut self, columns: usize) -> Self {
        self.columns = columns;
        self
    }

    fn accepts(&self, cell: &HeatMapCell) -> bool {
        self.filter.as_ref().map_or(true, |f| f(cell))
    }

    /// Sort by one stat, shade by another, show a third.
    pub fn from_stat_keys(keys: StatKeys) -> Self {
        let StatKeys {
            sort_key,
            alpha_key,
            display_key,
            positive_color,
            negative_color,
        } = keys;

        let comparator = move |a: &HeatMapCell, b: &HeatMapCell| {
            let sa = a.stat(&sort_key).unwrap_or(f64::NEG_INFINITY);
            let sb = b.stat(&sort_key).unwrap_or(f64::NEG_INFINITY);
            sb.total_cmp(&sa).then_with(|| a.value.cmp(&b.value))
        };
        let display = move |cell: &HeatMapCell| match cell.stat(&display_key) {
            Some(v) => format!("{} ({:.2})", cell.value, v),
            None => cell.value.clone(),
        };
        let background = move |cell: &HeatMapCell| {
            let stat = cell.stat(&alpha_key).unwrap_or(0.0);
            let color = if stat < 0.0 { negative_color } else { positive_color };
            color.with_alpha(stat.abs())
        };
        Self::new(comparator, display, background)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// CSS `rgba()` with alpha clamped to [0, 1].
    pub fn with_alpha(&self, alpha: f64) -> String {
        let alpha = if alpha.is_nan() { 0.0 } else { alpha.clamp(0.0, 1.0) };
        format!("rgba({},{},{},{:.2})", self.0, self.1, self.2, alpha)
    }
}

#[derive(Debug, Clone)]
pub struct StatKeys {
    pub sort_key: String,
    pub alpha_key: String,
    pub display_key: String,
    pub positive_color: Rgb,
    pub negative_color: Rgb,
}

impl StatKeys {
    pub fn new(
        sort_key: impl Into<String>,
        alpha_key: impl Into<String>,
        display_key: impl Into<String>,
    ) -> Self {
        Self {
            sort_key: sort_key.into(),
            alpha_key: alpha_key.into(),
            display_key: display_key.into(),
            positive_color: Rgb(0, 0, 255),
            negative_color: Rgb(255, 0, 0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedCell {
    pub content: String,
    pub background_color: String,
    pub drill_down: DrillDown,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedHeatMap {
    pub id: HeatMapId,
    pub caption: String,
    pub rows: Vec<Vec<RenderedCell>>,
}

impl RenderedHeatMap {
    pub fn cell_count(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }
}

/// Packs items into rows of `columns`, keeping a short final row.
pub fn group_rows<T>(items: impl IntoIterator<Item = T>, columns: usize) -> Vec<Vec<T>> {
    let columns = columns.max(1);
    let mut rows = Vec::new();
    let mut current = Vec::with_capacity(columns);
    for item in items {
        current.push(item);
        if current.len() == columns {
            rows.push(std::mem::replace(&mut current, Vec::with_capacity(columns)));
        }
    }
    if !current.is_empty() {
        rows.push(current);
    }
    rows
}

fn render_one(mut heat_map: HeatMap, options: &RenderOptions) -> RenderedHeatMap {
    heat_map.cells.sort_by(|a, b| (options.comparator)(a, b));

    let dimension = heat_map.id.dimension.clone();
    let accepted = heat_map
        .cells
        .iter()
        .filter(|cell| options.accepts(cell))
        .map(|cell| RenderedCell {
            content: (options.display)(cell),
            background_color: (options.background_color)(cell),
            drill_down: DrillDown {
                dimension: dimension.clone(),
                value: cell.value.clone(),
            },
        });
    let rows = group_rows(accepted, options.columns);

    RenderedHeatMap {
        caption: heat_map.id.caption(),
        id: heat_map.id,
        rows,
    }
}

pub fn render(dataset: HeatMapDataset, options: &RenderOptions) -> Vec<RenderedHeatMap> {
    let _profile = ProfileScope::with_context(
        "heatmap",
        "render",
        &[("heat_maps", v_num(dataset.len() as f64))],
    );
    dataset
        .into_iter()
        .map(|heat_map| render_one(heat_map, options))
        .collect()
}
