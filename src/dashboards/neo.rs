use crate::data::aggregate::{AggregateSpec, aggregate};
use crate::data::derive::{DerivedField, derive};
use crate::data::error::PipelineError;
use crate::data::filter::{Predicate, filter};
use crate::data::model::{Table, Value};

use super::{ChartSpec, DashboardView, HazardFilter, MetricDisplay};

pub const HAZARD_FIELD: &str = "hazardous";
pub const AVG_DIAMETER: &str = "avg_diameter";
const DIAMETER_MIN: &str = "est_diameter_min";
const DIAMETER_MAX: &str = "est_diameter_max";
const VELOCITY: &str = "relative_velocity";
const MISS_DISTANCE: &str = "miss_distance";

pub const TOTAL: &str = "Total NEOs";
pub const AVG_DIAMETER_METRIC: &str = "Average Diameter (km)";
pub const HAZARD_COUNT: &str = "Potentially Hazardous";

pub const SCALE_RANGE: std::ops::RangeInclusive<f64> = 1.0..=1000.0;
pub const DEFAULT_SCALE: f64 = 100.0;
const HISTOGRAM_BINS: usize = 40;

/// Transform applied to `avg_diameter` before charting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransformMode {
    #[default]
    None,
    CubeRoot,
    ScaleFactor,
}

impl TransformMode {
    pub const ALL: [TransformMode; 3] = [
        TransformMode::None,
        TransformMode::CubeRoot,
        TransformMode::ScaleFactor,
    ];

    pub fn label(self) -> &'static str {
        match self {
            TransformMode::None => "None",
            TransformMode::CubeRoot => "Cube Root",
            TransformMode::ScaleFactor => "Scale Factor",
        }
    }

    fn derived_field(self, scale_factor: f64) -> Option<DerivedField> {
        match self {
            TransformMode::None => None,
            TransformMode::CubeRoot => Some(DerivedField::cube_root(AVG_DIAMETER, AVG_DIAMETER)),
            TransformMode::ScaleFactor => {
                Some(DerivedField::scale(AVG_DIAMETER, AVG_DIAMETER, scale_factor))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection {
    pub hazard: HazardFilter,
    pub transform: TransformMode,
    /// Only read when `transform` is [`TransformMode::ScaleFactor`].
    pub scale_factor: f64,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            hazard: HazardFilter::All,
            transform: TransformMode::None,
            scale_factor: DEFAULT_SCALE,
        }
    }
}

/// Average the diameter estimates, filter by hazard, summarise the
/// untransformed subset, then transform the diameter for the charts.
pub fn build_view(table: &Table, selection: &Selection) -> Result<DashboardView, PipelineError> {
    let predicates =
        selection
            .hazard
            .predicate(HAZARD_FIELD, Value::Bool(true), Value::Bool(false));
    let filtered = filter(table, &predicates)?;
    let filtered = derive(
        &filtered,
        &[DerivedField::mean(AVG_DIAMETER, DIAMETER_MIN, DIAMETER_MAX)],
    )?;

    let summary = aggregate(
        &filtered,
        &[
            AggregateSpec::count(TOTAL),
            AggregateSpec::mean(AVG_DIAMETER_METRIC, AVG_DIAMETER),
            AggregateSpec::count_where(HAZARD_COUNT, Predicate::equals(HAZARD_FIELD, true)),
        ],
    )?;

    let scale = selection.scale_factor.clamp(*SCALE_RANGE.start(), *SCALE_RANGE.end());
    let transformed = match selection.transform.derived_field(scale) {
        Some(field) => derive(&filtered, &[field])?,
        None => filtered.clone(),
    };

    let mode = selection.transform.label();
    let charts = vec![
        ChartSpec::histogram(
            format!("Size Distribution of NEOs ({mode} transform)"),
            AVG_DIAMETER,
            HISTOGRAM_BINS,
            HAZARD_FIELD,
        )
        .labels("Average Diameter (km)", "count"),
        ChartSpec::scatter(
            format!("Size vs Relative Velocity ({mode} Transform)"),
            AVG_DIAMETER,
            VELOCITY,
            HAZARD_FIELD,
        )
        .labels("Average Diameter (km)", "Relative Velocity (km/s)"),
        ChartSpec::scatter(
            format!("Miss Distance vs Velocity ({mode} Transform)"),
            MISS_DISTANCE,
            VELOCITY,
            HAZARD_FIELD,
        )
        .labels("Miss Distance (km)", "Relative Velocity (km/s)"),
    ];

    Ok(DashboardView {
        table: transformed,
        summary,
        metrics: vec![
            MetricDisplay::new(TOTAL, 0, ""),
            MetricDisplay::new(AVG_DIAMETER_METRIC, 2, ""),
            MetricDisplay::new(HAZARD_COUNT, 0, ""),
        ],
        charts,
        detail: Some(filtered),
    })
}
