use std::cmp::Ordering;
use std::collections::BTreeSet;

use super::error::PipelineError;
use super::model::{Record, Table, Value};

// ---------------------------------------------------------------------------
// Filter predicates
// ---------------------------------------------------------------------------

/// A boolean test over one record's fields.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// The field equals the value (numbers compare by value).
    Equals { field: String, value: Value },
    /// The field equals one of the values. An empty set matches nothing.
    In { field: String, values: BTreeSet<Value> },
}

impl Predicate {
    pub fn equals(field: &str, value: impl Into<Value>) -> Self {
        Predicate::Equals {
            field: field.to_string(),
            value: value.into(),
        }
    }

    pub fn one_of(field: &str, values: impl IntoIterator<Item = Value>) -> Self {
        Predicate::In {
            field: field.to_string(),
            values: values.into_iter().collect(),
        }
    }

    pub fn field(&self) -> &str {
        match self {
            Predicate::Equals { field, .. } | Predicate::In { field, .. } => field,
        }
    }

    pub fn test(&self, record: &Record) -> bool {
        match self {
            Predicate::Equals { field, value } => record.get(field).matches(value),
            Predicate::In { field, values } => {
                let v = record.get(field);
                values.contains(v) || values.iter().any(|candidate| v.matches(candidate))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline stages
// ---------------------------------------------------------------------------

/// Keep the records passing every predicate, in their original order.
///
/// An empty predicate list returns the table unchanged.
pub fn filter(table: &Table, predicates: &[Predicate]) -> Result<Table, PipelineError> {
    for p in predicates {
        table.require_column(p.field(), "filter")?;
    }
    let records = table
        .records()
        .iter()
        .filter(|r| predicates.iter().all(|p| p.test(r)))
        .cloned()
        .collect();
    Ok(table.with_records(records))
}

/// Stable ascending sort on one field; `Null` sorts last.
pub fn sort_by(table: &Table, field: &str) -> Result<Table, PipelineError> {
    table.require_column(field, "sort_by")?;
    let mut records = table.records().to_vec();
    records.sort_by(|a, b| compare_for_sort(a.get(field), b.get(field)));
    Ok(table.with_records(records))
}

fn compare_for_sort(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        _ => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            _ => a.cmp(b),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hazard_table() -> Table {
        let records = [true, false, true, true, false]
            .iter()
            .enumerate()
            .map(|(i, h)| {
                [
                    ("id".to_string(), Value::Integer(i as i64)),
                    ("hazardous".to_string(), Value::Bool(*h)),
                ]
                .into_iter()
                .collect()
            })
            .collect();
        Table::new(vec!["id".into(), "hazardous".into()], records)
    }

    fn ids(t: &Table) -> Vec<i64> {
        t.records()
            .iter()
            .filter_map(|r| r.number("id").map(|v| v as i64))
            .collect()
    }

    #[test]
    fn equality_filter_keeps_relative_order() {
        let t = hazard_table();
        let out = filter(&t, &[Predicate::equals("hazardous", true)]).unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(ids(&out), vec![0, 2, 3]);
    }

    #[test]
    fn empty_predicate_set_is_identity() {
        let t = hazard_table();
        assert_eq!(filter(&t, &[]).unwrap(), t);
    }

    #[test]
    fn filter_is_idempotent() {
        let t = hazard_table();
        let preds = [Predicate::equals("hazardous", false)];
        let once = filter(&t, &preds).unwrap();
        let twice = filter(&once, &preds).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn membership_and_conjunction() {
        let t = hazard_table();
        let preds = [
            Predicate::one_of("id", [Value::Integer(1), Value::Float(2.0), Value::Integer(3)]),
            Predicate::equals("hazardous", true),
        ];
        let out = filter(&t, &preds).unwrap();
        assert_eq!(ids(&out), vec![2, 3]);
    }

    #[test]
    fn empty_membership_set_matches_nothing() {
        let t = hazard_table();
        let out = filter(&t, &[Predicate::one_of("id", std::iter::empty::<Value>())]).unwrap();
        assert!(out.is_empty());
        assert_eq!(out.columns(), t.columns());
    }

    #[test]
    fn unknown_field_is_a_schema_error() {
        let t = hazard_table();
        let err = filter(&t, &[Predicate::equals("Hazardous Group", "Hazardous")]).unwrap_err();
        assert!(matches!(err, PipelineError::Schema { operation: "filter", .. }));
    }

    #[test]
    fn sort_is_stable_with_nulls_last() {
        let rows = [(Value::Integer(2), "a"), (Value::Null, "b"), (Value::Integer(1), "c"), (Value::Integer(2), "d")];
        let records = rows
            .iter()
            .map(|(k, tag)| {
                [("k".to_string(), k.clone()), ("tag".to_string(), Value::from(*tag))]
                    .into_iter()
                    .collect()
            })
            .collect();
        let t = Table::new(vec!["k".into(), "tag".into()], records);
        let sorted = sort_by(&t, "k").unwrap();
        let tags: Vec<String> = sorted.records().iter().map(|r| r.get("tag").to_string()).collect();
        assert_eq!(tags, vec!["c", "a", "d", "b"]);
    }
}
