use std::fmt;

use super::error::PipelineError;
use super::filter::Predicate;
use super::model::Table;

// ---------------------------------------------------------------------------
// Aggregate specifications
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum AggregateKind {
    /// Number of records.
    Count,
    /// Arithmetic mean over records where the field is numeric.
    Mean(String),
    /// Number of records passing the predicate.
    CountWhere(Predicate),
}

/// A named summary statistic to compute.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateSpec {
    pub name: String,
    pub kind: AggregateKind,
}

impl AggregateSpec {
    pub fn count(name: &str) -> Self {
        Self::new(name, AggregateKind::Count)
    }

    pub fn mean(name: &str, field: &str) -> Self {
        Self::new(name, AggregateKind::Mean(field.to_string()))
    }

    pub fn count_where(name: &str, predicate: Predicate) -> Self {
        Self::new(name, AggregateKind::CountWhere(predicate))
    }

    fn new(name: &str, kind: AggregateKind) -> Self {
        AggregateSpec {
            name: name.to_string(),
            kind,
        }
    }
}

/// Result of one aggregate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    Count(usize),
    Number(f64),
    /// Nothing to summarise (e.g. mean over zero defined values).
    NoData,
}

impl Scalar {
    /// Format with a fixed number of decimals; counts are printed as-is.
    pub fn format(&self, decimals: usize) -> String {
        match self {
            Scalar::Count(n) => n.to_string(),
            Scalar::Number(v) => format!("{v:.decimals$}"),
            Scalar::NoData => "n/a".to_string(),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Count(n) => write!(f, "{n}"),
            Scalar::Number(v) => write!(f, "{v}"),
            Scalar::NoData => write!(f, "n/a"),
        }
    }
}

/// Aggregate results keyed by name, in request order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summary {
    entries: Vec<(String, Scalar)>,
}

impl Summary {
    pub fn get(&self, name: &str) -> Option<Scalar> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, s)| *s)
    }
}

// ---------------------------------------------------------------------------
// Pipeline stage
// ---------------------------------------------------------------------------

/// Compute the requested summary statistics over `table`.
pub fn aggregate(table: &Table, specs: &[AggregateSpec]) -> Result<Summary, PipelineError> {
    let mut entries = Vec::with_capacity(specs.len());
    for spec in specs {
        let value = match &spec.kind {
            AggregateKind::Count => Scalar::Count(table.len()),
            AggregateKind::Mean(field) => {
                table.require_column(field, "aggregate")?;
                mean(table, field)
            }
            AggregateKind::CountWhere(predicate) => {
                table.require_column(predicate.field(), "aggregate")?;
                Scalar::Count(table.records().iter().filter(|r| predicate.test(r)).count())
            }
        };
        entries.push((spec.name.clone(), value));
    }
    Ok(Summary { entries })
}

fn mean(table: &Table, field: &str) -> Scalar {
    let (sum, n) = table
        .records()
        .iter()
        .filter_map(|r| r.number(field))
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    if n == 0 {
        Scalar::NoData
    } else {
        Scalar::Number(sum / n as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::derive::{DerivedField, derive};
    use crate::data::filter::filter;
    use crate::data::model::Record;

    fn margin_table(rows: &[(f64, f64)]) -> Table {
        let records: Vec<Record> = rows
            .iter()
            .map(|(rev, cost)| [("rev", *rev), ("cost", *cost)].into_iter().collect())
            .collect();
        let t = Table::new(vec!["rev".into(), "cost".into()], records);
        derive(&t, &[DerivedField::margin_percent("margin", "rev", "cost")]).unwrap()
    }

    #[test]
    fn mean_skips_undefined_margins() {
        let t = margin_table(&[(0.0, 10.0), (100.0, 50.0)]);
        let summary = aggregate(&t, &[AggregateSpec::mean("avg", "margin")]).unwrap();
        assert_eq!(summary.get("avg"), Some(Scalar::Number(50.0)));
    }

    #[test]
    fn mean_over_empty_table_is_no_data() {
        let t = margin_table(&[]);
        let summary = aggregate(&t, &[AggregateSpec::mean("avg", "margin")]).unwrap();
        assert_eq!(summary.get("avg"), Some(Scalar::NoData));
        assert_eq!(summary.get("avg").map(|s| s.format(2)), Some("n/a".to_string()));
    }

    #[test]
    fn count_matches_filtered_length() {
        let records: Vec<Record> = [true, false, true, true, false]
            .iter()
            .map(|h| [("hazardous", *h)].into_iter().collect())
            .collect();
        let t = Table::new(vec!["hazardous".into()], records);
        let hazardous = filter(&t, &[Predicate::equals("hazardous", true)]).unwrap();
        let summary = aggregate(
            &hazardous,
            &[
                AggregateSpec::count("total"),
                AggregateSpec::count_where("flagged", Predicate::equals("hazardous", true)),
            ],
        )
        .unwrap();
        assert_eq!(summary.get("total"), Some(Scalar::Count(hazardous.len())));
        assert_eq!(summary.get("total"), Some(Scalar::Count(3)));
        assert_eq!(summary.get("flagged"), Some(Scalar::Count(3)));
    }

    #[test]
    fn summary_keeps_request_order() {
        let t = margin_table(&[(10.0, 5.0)]);
        let summary = aggregate(
            &t,
            &[AggregateSpec::mean("b", "rev"), AggregateSpec::count("a")],
        )
        .unwrap();
        let names: Vec<&str> = summary.entries.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn unknown_mean_field_is_a_schema_error() {
        let t = margin_table(&[]);
        assert!(aggregate(&t, &[AggregateSpec::mean("avg", "profit")]).is_err());
    }
}
