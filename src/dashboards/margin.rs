use std::collections::BTreeSet;

use crate::data::aggregate::{AggregateSpec, aggregate};
use crate::data::derive::{DerivedField, coerce_date, coerce_numeric, derive};
use crate::data::error::PipelineError;
use crate::data::filter::{Predicate, filter, sort_by};
use crate::data::model::{Table, Value};

use super::{ChartKind, ChartSpec, DashboardView, MetricDisplay};

pub const GROUP_FIELD: &str = "TopGrp";
pub const PERIOD: &str = "Period";
pub const REVENUE: &str = "Total Revenue";
pub const COST: &str = "Total Cost";
pub const GROSS_MARGIN: &str = "Gross Margin %";
pub const GROSS_PROFIT: &str = "Gross Profit %";

pub const LINE_ITEMS: &str = "Line Items";
pub const AVG_MARGIN: &str = "Avg Gross Margin %";

/// Multi-select over `TopGrp` values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub groups: BTreeSet<Value>,
}

/// Clean the raw export once after load: numeric revenue/cost, margin
/// columns, and real dates for `Period`.
pub fn prepare(raw: &Table) -> Result<Table, PipelineError> {
    let table = coerce_numeric(raw, REVENUE)?;
    let table = coerce_numeric(&table, COST)?;
    let table = derive(
        &table,
        &[
            DerivedField::margin_percent(GROSS_MARGIN, REVENUE, COST),
            DerivedField::copy(GROSS_PROFIT, GROSS_MARGIN),
        ],
    )?;
    coerce_date(&table, PERIOD)
}

/// Group options in the order they first appear in the data.
pub fn group_options(prepared: &Table) -> Vec<Value> {
    prepared.distinct_in_order(GROUP_FIELD)
}

/// Initial selection: the first group only.
pub fn default_selection(prepared: &Table) -> Selection {
    Selection {
        groups: group_options(prepared).into_iter().take(1).collect(),
    }
}

/// Keep the selected groups, order by period, summarise and lay out the charts.
pub fn build_view(prepared: &Table, selection: &Selection) -> Result<DashboardView, PipelineError> {
    let filtered = filter(
        prepared,
        &[Predicate::one_of(GROUP_FIELD, selection.groups.iter().cloned())],
    )?;
    let filtered = sort_by(&filtered, PERIOD)?;

    let summary = aggregate(
        &filtered,
        &[
            AggregateSpec::count(LINE_ITEMS),
            AggregateSpec::mean(AVG_MARGIN, GROSS_MARGIN),
        ],
    )?;

    let charts = vec![
        ChartSpec::scatter("Gross Margin % Over Time", PERIOD, GROSS_MARGIN, GROUP_FIELD)
            .kind(ChartKind::ScatterLines)
            .sized_by(REVENUE),
        ChartSpec::scatter("Gross Profit % Over Time", PERIOD, GROSS_PROFIT, GROUP_FIELD)
            .kind(ChartKind::GroupedBar)
            .labels("Month", "Gross Profit Percentage"),
    ];

    Ok(DashboardView {
        table: filtered,
        summary,
        metrics: vec![
            MetricDisplay::new(LINE_ITEMS, 0, ""),
            MetricDisplay::new(AVG_MARGIN, 1, "%"),
        ],
        charts,
        detail: None,
    })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::data::aggregate::Scalar;
    use crate::data::model::Record;

    fn raw() -> Table {
        let rows = [
            ("Parts", "2024-03-01", "$100.00", "$50.00"),
            ("Labor", "2024-01-01", "$1,000", "$400"),
            ("Parts", "2024-01-01", "$0", "$10"),
            ("Parts", "2024-02-01", "oops", "$10"),
        ];
        let records = rows
            .iter()
            .map(|(grp, period, rev, cost)| {
                let mut r = Record::default();
                r.set(GROUP_FIELD, Value::from(*grp));
                r.set(PERIOD, Value::from(*period));
                r.set(REVENUE, Value::from(*rev));
                r.set(COST, Value::from(*cost));
                r
            })
            .collect();
        Table::new(
            [GROUP_FIELD, PERIOD, REVENUE, COST].iter().map(|c| c.to_string()).collect(),
            records,
        )
    }

    #[test]
    fn prepare_coerces_and_derives() {
        let t = prepare(&raw()).unwrap();
        let labor = &t.records()[1];
        assert_eq!(labor.get(REVENUE), &Value::Float(1000.0));
        assert_eq!(labor.get(GROSS_MARGIN), &Value::Float(60.0));
        assert_eq!(labor.get(GROSS_PROFIT), &Value::Float(60.0));
        assert_eq!(
            labor.get(PERIOD),
            &Value::Date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
        );
        assert_eq!(t.records()[2].get(GROSS_MARGIN), &Value::Null);
        assert_eq!(t.records()[3].get(REVENUE), &Value::Null);
        assert_eq!(t.records()[3].get(GROSS_MARGIN), &Value::Null);
    }

    #[test]
    fn default_selection_is_first_group() {
        let t = prepare(&raw()).unwrap();
        assert_eq!(group_options(&t), vec![Value::from("Parts"), Value::from("Labor")]);
        let selection = default_selection(&t);
        assert_eq!(selection.groups.len(), 1);
        assert!(selection.groups.contains(&Value::from("Parts")));
    }

    #[test]
    fn view_sorts_by_period_and_skips_undefined_margins() {
        let t = prepare(&raw()).unwrap();
        let view = build_view(&t, &default_selection(&t)).unwrap();

        let months: Vec<String> = view
            .table
            .records()
            .iter()
            .map(|r| r.get(PERIOD).to_string())
            .collect();
        assert_eq!(months, vec!["2024-01-01", "2024-02-01", "2024-03-01"]);

        assert_eq!(view.summary.get(LINE_ITEMS), Some(Scalar::Count(3)));
        assert_eq!(view.summary.get(AVG_MARGIN), Some(Scalar::Number(50.0)));
    }

    #[test]
    fn empty_selection_shows_nothing() {
        let t = prepare(&raw()).unwrap();
        let view = build_view(&t, &Selection::default()).unwrap();
        assert!(view.table.is_empty());
        assert_eq!(view.summary.get(AVG_MARGIN), Some(Scalar::NoData));
    }
}
