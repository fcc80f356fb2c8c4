use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{Datelike, NaiveDate};

use super::error::PipelineError;

// ---------------------------------------------------------------------------
// Value – a single cell of a table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring common DataFrame dtypes.
/// Using `BTreeMap` / `BTreeSet` downstream so `Value` must be `Ord`.
///
/// `Null` doubles as the explicit "undefined" marker: missing cells,
/// unparsable numbers and failed derivations all end up here.
#[derive(Debug, Clone)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Date(NaiveDate),
    Null,
}

// -- Manual Eq/Ord so we can put Value in BTreeSet --

/// Equality agrees with `Ord`: floats compare with `total_cmp`, so
/// `0.0 != -0.0` and `NaN == NaN`.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use Value::*;
        fn discriminant(v: &Value) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
                Date(_) => 5,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            (Date(a), Date(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{s}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v:.4}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::Null => write!(f, "<null>"),
        }
    }
}

impl From<f64> for Value {
    /// Non-finite floats are stored as `Null`.
    fn from(v: f64) -> Self {
        if v.is_finite() {
            Value::Float(v)
        } else {
            Value::Null
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl Value {
    /// Try to interpret the value as an `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Position of the value on a plot axis. Dates map to days since 1970-01-01.
    pub fn as_axis_f64(&self) -> Option<f64> {
        match self {
            Value::Date(d) => Some(days_since_epoch(*d) as f64),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            other => other.as_f64(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Equality used by filter predicates: numbers compare by value,
    /// so `Integer(1)` matches `Float(1.0)`.
    pub fn matches(&self, other: &Value) -> bool {
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => self == other,
        }
    }
}

const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

pub fn days_since_epoch(date: NaiveDate) -> i64 {
    i64::from(date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE)
}

pub fn date_from_epoch_days(days: i64) -> Option<NaiveDate> {
    let days = i32::try_from(days).ok()?;
    NaiveDate::from_num_days_from_ce_opt(days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)?)
}

// ---------------------------------------------------------------------------
// Record – one row of the table
// ---------------------------------------------------------------------------

static NULL: Value = Value::Null;

/// A single row: column_name → value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    pub fields: BTreeMap<String, Value>,
}

impl Record {
    /// Value of a field, `Null` when the row has no such cell.
    pub fn get(&self, field: &str) -> &Value {
        self.fields.get(field).unwrap_or(&NULL)
    }

    pub fn set(&mut self, field: &str, value: Value) {
        self.fields.insert(field.to_string(), value);
    }

    pub fn number(&self, field: &str) -> Option<f64> {
        self.get(field).as_f64()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Record {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Table – ordered records sharing a schema
// ---------------------------------------------------------------------------

/// An ordered sequence of records plus the ordered column schema.
///
/// Every pipeline stage takes `&Table` and returns a fresh `Table`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    records: Vec<Record>,
}

impl Table {
    /// Build a table. Columns are kept in the given order; duplicates are dropped.
    pub fn new(columns: Vec<String>, records: Vec<Record>) -> Self {
        let mut seen = BTreeSet::new();
        let columns = columns
            .into_iter()
            .filter(|c| seen.insert(c.clone()))
            .collect();
        Table { columns, records }
    }

    /// A table with the same schema holding `records`.
    pub fn with_records(&self, records: Vec<Record>) -> Self {
        Table {
            columns: self.columns.clone(),
            records,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_column(&self, field: &str) -> bool {
        self.columns.iter().any(|c| c == field)
    }

    /// Fail with a schema error when `field` is not a column of this table.
    pub fn require_column(&self, field: &str, operation: &'static str) -> Result<(), PipelineError> {
        if self.has_column(field) {
            Ok(())
        } else {
            Err(PipelineError::Schema {
                field: field.to_string(),
                operation,
            })
        }
    }

    /// Sorted set of distinct values of a column (including `Null`).
    pub fn unique_values(&self, field: &str) -> BTreeSet<Value> {
        self.records.iter().map(|r| r.get(field).clone()).collect()
    }

    /// Distinct values in first-seen order, skipping `Null`.
    pub fn distinct_in_order(&self, field: &str) -> Vec<Value> {
        let mut seen = BTreeSet::new();
        self.records
            .iter()
            .map(|r| r.get(field))
            .filter(|v| !v.is_null() && seen.insert((*v).clone()))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_ordering_groups_by_kind() {
        let mut set = BTreeSet::new();
        set.insert(Value::from("b"));
        set.insert(Value::Null);
        set.insert(Value::Integer(3));
        set.insert(Value::from("a"));
        let ordered: Vec<_> = set.into_iter().collect();
        assert_eq!(
            ordered,
            vec![
                Value::Null,
                Value::Integer(3),
                Value::from("a"),
                Value::from("b")
            ]
        );
    }

    #[test]
    fn equality_agrees_with_ordering() {
        let zero = Value::Float(0.0);
        let neg_zero = Value::Float(-0.0);
        assert_ne!(zero, neg_zero);
        assert_eq!(zero.cmp(&neg_zero) == std::cmp::Ordering::Equal, zero == neg_zero);
        let set: BTreeSet<Value> = [zero.clone(), neg_zero.clone(), zero].into_iter().collect();
        assert_eq!(set.len(), 2);
        // numeric matching is still by value
        assert!(neg_zero.matches(&Value::Integer(0)));
    }

    #[test]
    fn non_finite_float_becomes_null() {
        assert_eq!(Value::from(f64::NAN), Value::Null);
        assert_eq!(Value::from(f64::INFINITY), Value::Null);
        assert_eq!(Value::from(2.5), Value::Float(2.5));
    }

    #[test]
    fn numeric_values_match_across_kinds() {
        assert!(Value::Integer(1).matches(&Value::Float(1.0)));
        assert!(!Value::Integer(1).matches(&Value::from("1")));
        assert!(Value::Bool(true).matches(&Value::Bool(true)));
    }

    #[test]
    fn epoch_day_conversion() {
        let d = NaiveDate::from_ymd_opt(1970, 1, 2).unwrap();
        assert_eq!(days_since_epoch(d), 1);
        assert_eq!(date_from_epoch_days(1), Some(d));
    }

    #[test]
    fn missing_cell_reads_as_null() {
        let r: Record = [("a", 1i64)].into_iter().collect();
        assert_eq!(r.get("b"), &Value::Null);
        assert_eq!(r.number("a"), Some(1.0));
    }

    #[test]
    fn duplicate_columns_are_dropped() {
        let t = Table::new(vec!["a".into(), "b".into(), "a".into()], Vec::new());
        assert_eq!(t.columns(), &["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn distinct_in_order_keeps_first_seen() {
        let records = ["y", "x", "y", "z"]
            .iter()
            .map(|g| [("grp", *g)].into_iter().collect())
            .collect();
        let t = Table::new(vec!["grp".into()], records);
        assert_eq!(
            t.distinct_in_order("grp"),
            vec![Value::from("y"), Value::from("x"), Value::from("z")]
        );
    }
}
