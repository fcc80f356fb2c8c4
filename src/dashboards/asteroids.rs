use crate::data::aggregate::{AggregateSpec, aggregate};
use crate::data::error::PipelineError;
use crate::data::filter::{Predicate, filter};
use crate::data::model::{Table, Value};

use super::{ChartSpec, DashboardView, HazardFilter, MetricDisplay};

pub const HAZARD_FIELD: &str = "Hazardous Group";
pub const HAZARDOUS: &str = "Hazardous";
pub const NON_HAZARDOUS: &str = "Non-Hazardous";
pub const CLASS_FIELD: &str = "Object Class Group";
pub const NAME_FIELD: &str = "Object Name";

const AXIS: &str = "Orbit Axis (AU)";
const ECCENTRICITY: &str = "Orbit Eccentricity";
const PERIOD: &str = "Orbital Period (yr)";
const MAGNITUDE: &str = "Asteroid Magnitude";
const PERIHELION: &str = "Perihelion Distance (AU)";
const INCLINATION: &str = "Orbit Inclination (deg)";
const MOID: &str = "Minimum Orbit Intersection Distance (AU)";

pub const TOTAL: &str = "Total Asteroids";
pub const AVG_PERIOD: &str = "Avg Orbital Period";
pub const AVG_MOID: &str = "Avg MOID";
pub const HAZARD_COUNT: &str = "Potentially Hazardous";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    pub hazard: HazardFilter,
}

/// Filter by hazard group, then summarise and lay out the four orbit scatters.
pub fn build_view(table: &Table, selection: &Selection) -> Result<DashboardView, PipelineError> {
    let predicates = selection.hazard.predicate(
        HAZARD_FIELD,
        Value::from(HAZARDOUS),
        Value::from(NON_HAZARDOUS),
    );
    let filtered = filter(table, &predicates)?;

    let summary = aggregate(
        &filtered,
        &[
            AggregateSpec::count(TOTAL),
            AggregateSpec::mean(AVG_PERIOD, PERIOD),
            AggregateSpec::mean(AVG_MOID, MOID),
            AggregateSpec::count_where(HAZARD_COUNT, Predicate::equals(HAZARD_FIELD, HAZARDOUS)),
        ],
    )?;

    let charts: Vec<ChartSpec> = [
        ("Orbital Parameters", AXIS, ECCENTRICITY),
        ("Size Distribution", PERIOD, MAGNITUDE),
        ("Inclination vs Distance", PERIHELION, INCLINATION),
        ("Risk Assessment", MOID, ECCENTRICITY),
    ]
    .into_iter()
    .map(|(title, x, y)| ChartSpec::scatter(title, x, y, CLASS_FIELD).hover_by(NAME_FIELD))
    .collect();

    Ok(DashboardView {
        table: filtered,
        summary,
        metrics: vec![
            MetricDisplay::new(TOTAL, 0, ""),
            MetricDisplay::new(AVG_PERIOD, 2, "years"),
            MetricDisplay::new(AVG_MOID, 3, "AU"),
            MetricDisplay::new(HAZARD_COUNT, 0, ""),
        ],
        charts,
        detail: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::aggregate::Scalar;
    use crate::data::model::Record;

    fn orbits() -> Table {
        let rows = [
            ("433 Eros", HAZARDOUS, "AMO", 1.76, 0.15),
            ("Apophis", HAZARDOUS, "ATE", 0.89, 0.0002),
            ("1036 Ganymed", NON_HAZARDOUS, "AMO", 4.34, 0.34),
        ];
        let columns = [NAME_FIELD, HAZARD_FIELD, CLASS_FIELD, PERIOD, MOID, AXIS, ECCENTRICITY, MAGNITUDE, PERIHELION, INCLINATION];
        let records = rows
            .iter()
            .map(|(name, group, class, period, moid)| {
                let mut r = Record::default();
                r.set(NAME_FIELD, Value::from(*name));
                r.set(HAZARD_FIELD, Value::from(*group));
                r.set(CLASS_FIELD, Value::from(*class));
                r.set(PERIOD, Value::Float(*period));
                r.set(MOID, Value::Float(*moid));
                r
            })
            .collect();
        Table::new(columns.iter().map(|c| c.to_string()).collect(), records)
    }

    #[test]
    fn all_keeps_every_asteroid() {
        let view = build_view(&orbits(), &Selection::default()).unwrap();
        assert_eq!(view.summary.get(TOTAL), Some(Scalar::Count(3)));
        assert_eq!(view.summary.get(HAZARD_COUNT), Some(Scalar::Count(2)));
        assert_eq!(view.charts.len(), 4);
    }

    #[test]
    fn scatters_show_object_name_on_hover() {
        let view = build_view(&orbits(), &Selection::default()).unwrap();
        for chart in &view.charts {
            assert_eq!(chart.hover_by.as_deref(), Some(NAME_FIELD));
            assert_eq!(chart.color_by, CLASS_FIELD);
        }
    }

    #[test]
    fn hazardous_only_filters_and_summarises() {
        let selection = Selection {
            hazard: HazardFilter::HazardousOnly,
        };
        let view = build_view(&orbits(), &selection).unwrap();
        assert_eq!(view.table.len(), 2);
        assert_eq!(view.summary.get(HAZARD_COUNT), Some(Scalar::Count(2)));
        let Some(Scalar::Number(avg)) = view.summary.get(AVG_PERIOD) else {
            panic!("expected a mean period");
        };
        assert!((avg - 1.325).abs() < 1e-9);
    }

    #[test]
    fn metric_tiles_format_units() {
        let selection = Selection {
            hazard: HazardFilter::NonHazardousOnly,
        };
        let view = build_view(&orbits(), &selection).unwrap();
        let tiles = view.metric_tiles();
        assert_eq!(tiles[0], (TOTAL, "1".to_string()));
        assert_eq!(tiles[1], (AVG_PERIOD, "4.34 years".to_string()));
        assert_eq!(tiles[2], (AVG_MOID, "0.340 AU".to_string()));
        assert_eq!(tiles[3], (HAZARD_COUNT, "0".to_string()));
    }

    #[test]
    fn missing_hazard_column_is_a_schema_error() {
        let table = Table::new(vec![PERIOD.to_string(), MOID.to_string()], Vec::new());
        let selection = Selection {
            hazard: HazardFilter::HazardousOnly,
        };
        assert!(matches!(
            build_view(&table, &selection),
            Err(PipelineError::Schema { .. })
        ));
    }
}
