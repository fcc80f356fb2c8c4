//! Per-dataset pipelines. Each dashboard turns a loaded [`Table`] and the
//! user's current selection into a [`DashboardView`] for the renderer.

pub mod asteroids;
pub mod margin;
pub mod neo;

use crate::data::aggregate::Summary;
use crate::data::filter::Predicate;
use crate::data::model::{Table, Value};

// ---------------------------------------------------------------------------
// Dashboard identity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dashboard {
    #[default]
    Asteroids,
    Neo,
    Margin,
}

impl Dashboard {
    pub const ALL: [Dashboard; 3] = [Dashboard::Asteroids, Dashboard::Neo, Dashboard::Margin];

    pub fn title(self) -> &'static str {
        match self {
            Dashboard::Asteroids => "Asteroid Analysis",
            Dashboard::Neo => "Near-Earth Objects",
            Dashboard::Margin => "Company Margins",
        }
    }

    /// File name looked up in the data directory when no explicit path is given.
    pub fn default_file(self) -> &'static str {
        match self {
            Dashboard::Asteroids => "orbits.csv",
            Dashboard::Neo => "neo_v2.csv",
            Dashboard::Margin => "data.csv",
        }
    }
}

// ---------------------------------------------------------------------------
// Shared selection: hazard radio buttons
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HazardFilter {
    #[default]
    All,
    HazardousOnly,
    NonHazardousOnly,
}

impl HazardFilter {
    pub const ALL: [HazardFilter; 3] = [
        HazardFilter::All,
        HazardFilter::HazardousOnly,
        HazardFilter::NonHazardousOnly,
    ];

    pub fn label(self) -> &'static str {
        match self {
            HazardFilter::All => "All",
            HazardFilter::HazardousOnly => "Hazardous Only",
            HazardFilter::NonHazardousOnly => "Non-Hazardous Only",
        }
    }

    /// Predicate on `field`, given the values that mark hazardous and
    /// non-hazardous records. `All` needs no predicate.
    pub fn predicate(self, field: &str, hazardous: Value, safe: Value) -> Vec<Predicate> {
        match self {
            HazardFilter::All => Vec::new(),
            HazardFilter::HazardousOnly => vec![Predicate::equals(field, hazardous)],
            HazardFilter::NonHazardousOnly => vec![Predicate::equals(field, safe)],
        }
    }
}

// ---------------------------------------------------------------------------
// View output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChartKind {
    Scatter,
    /// Scatter markers joined by a line per colour group.
    ScatterLines,
    Histogram { bins: usize },
    /// One bar per (x, colour group), side by side.
    GroupedBar,
}

/// What to draw; the renderer owns every visual encoding decision beyond this.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub title: String,
    pub kind: ChartKind,
    pub x: String,
    /// Unused for histograms.
    pub y: Option<String>,
    pub x_label: String,
    pub y_label: String,
    pub color_by: String,
    pub size_by: Option<String>,
    /// Field shown next to a point's coordinates on hover.
    pub hover_by: Option<String>,
}

impl ChartSpec {
    pub fn scatter(title: impl Into<String>, x: &str, y: &str, color_by: &str) -> Self {
        ChartSpec {
            title: title.into(),
            kind: ChartKind::Scatter,
            x: x.to_string(),
            y: Some(y.to_string()),
            x_label: x.to_string(),
            y_label: y.to_string(),
            color_by: color_by.to_string(),
            size_by: None,
            hover_by: None,
        }
    }

    pub fn histogram(title: impl Into<String>, x: &str, bins: usize, color_by: &str) -> Self {
        ChartSpec {
            title: title.into(),
            kind: ChartKind::Histogram { bins },
            x: x.to_string(),
            y: None,
            x_label: x.to_string(),
            y_label: "count".to_string(),
            color_by: color_by.to_string(),
            size_by: None,
            hover_by: None,
        }
    }

    pub fn kind(mut self, kind: ChartKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn labels(mut self, x_label: &str, y_label: &str) -> Self {
        self.x_label = x_label.to_string();
        self.y_label = y_label.to_string();
        self
    }

    pub fn sized_by(mut self, field: &str) -> Self {
        self.size_by = Some(field.to_string());
        self
    }

    pub fn hover_by(mut self, field: &str) -> Self {
        self.hover_by = Some(field.to_string());
        self
    }
}

/// How a summary entry is shown as a metric tile.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricDisplay {
    pub name: &'static str,
    pub decimals: usize,
    pub unit: &'static str,
}

impl MetricDisplay {
    pub const fn new(name: &'static str, decimals: usize, unit: &'static str) -> Self {
        MetricDisplay { name, decimals, unit }
    }
}

/// Everything the renderer needs for one dashboard refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    /// Table the charts draw from.
    pub table: Table,
    pub summary: Summary,
    pub metrics: Vec<MetricDisplay>,
    pub charts: Vec<ChartSpec>,
    /// Optional raw-data grid shown under the charts.
    pub detail: Option<Table>,
}

impl DashboardView {
    /// Metric tiles as `(label, formatted value)`.
    pub fn metric_tiles(&self) -> Vec<(&'static str, String)> {
        self.metrics
            .iter()
            .map(|m| {
                let value = self
                    .summary
                    .get(m.name)
                    .map(|s| s.format(m.decimals))
                    .unwrap_or_else(|| "n/a".to_string());
                let text = if m.unit.is_empty() || value == "n/a" {
                    value
                } else {
                    format!("{value} {}", m.unit)
                };
                (m.name, text)
            })
            .collect()
    }
}
