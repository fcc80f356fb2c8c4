use super::error::{ComputationError, PipelineError};
use super::loader::{parse_date, parse_number_lenient};
use super::model::{Record, Table, Value};

// ---------------------------------------------------------------------------
// Derived field specifications
// ---------------------------------------------------------------------------

/// How a derived value is computed from one record.
#[derive(Debug, Clone, PartialEq)]
pub enum DeriveKind {
    /// `(a + b) / 2`
    Mean(String, String),
    /// Real cube root; negative inputs stay negative.
    CubeRoot(String),
    /// `source * factor`
    Scale(String, f64),
    /// `(revenue - cost) / revenue * 100`
    MarginPercent { revenue: String, cost: String },
    /// The source value, unchanged.
    Copy(String),
}

/// A named field computed per record. If `name` already exists the column is replaced.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedField {
    pub name: String,
    pub kind: DeriveKind,
}

impl DerivedField {
    pub fn mean(name: &str, a: &str, b: &str) -> Self {
        Self::new(name, DeriveKind::Mean(a.into(), b.into()))
    }

    pub fn cube_root(name: &str, source: &str) -> Self {
        Self::new(name, DeriveKind::CubeRoot(source.into()))
    }

    pub fn scale(name: &str, source: &str, factor: f64) -> Self {
        Self::new(name, DeriveKind::Scale(source.into(), factor))
    }

    pub fn margin_percent(name: &str, revenue: &str, cost: &str) -> Self {
        Self::new(
            name,
            DeriveKind::MarginPercent {
                revenue: revenue.into(),
                cost: cost.into(),
            },
        )
    }

    pub fn copy(name: &str, source: &str) -> Self {
        Self::new(name, DeriveKind::Copy(source.into()))
    }

    fn new(name: &str, kind: DeriveKind) -> Self {
        DerivedField {
            name: name.to_string(),
            kind,
        }
    }

    /// Fields this computation reads.
    pub fn inputs(&self) -> Vec<&str> {
        match &self.kind {
            DeriveKind::Mean(a, b) => vec![a.as_str(), b.as_str()],
            DeriveKind::CubeRoot(src) | DeriveKind::Scale(src, _) | DeriveKind::Copy(src) => {
                vec![src.as_str()]
            }
            DeriveKind::MarginPercent { revenue, cost } => vec![revenue.as_str(), cost.as_str()],
        }
    }

    /// Compute the value for one record.
    pub fn compute(&self, record: &Record) -> Result<Value, ComputationError> {
        let value = match &self.kind {
            DeriveKind::Mean(a, b) => (number(record, a)? + number(record, b)?) / 2.0,
            DeriveKind::CubeRoot(src) => number(record, src)?.cbrt(),
            DeriveKind::Scale(src, factor) => number(record, src)? * factor,
            DeriveKind::MarginPercent { revenue, cost } => {
                let revenue = number(record, revenue)?;
                let cost = number(record, cost)?;
                if revenue == 0.0 {
                    return Err(ComputationError::DivideByZero);
                }
                (revenue - cost) / revenue * 100.0
            }
            DeriveKind::Copy(src) => return Ok(record.get(src).clone()),
        };
        if value.is_finite() {
            Ok(Value::Float(value))
        } else {
            Err(ComputationError::NonFinite)
        }
    }
}

fn number(record: &Record, field: &str) -> Result<f64, ComputationError> {
    match record.get(field) {
        Value::Null => Err(ComputationError::Missing(field.to_string())),
        v => v
            .as_f64()
            .ok_or_else(|| ComputationError::NotNumeric(field.to_string())),
    }
}

// ---------------------------------------------------------------------------
// Pipeline stages
// ---------------------------------------------------------------------------

/// Append (or replace) derived fields on every record.
///
/// Fields are computed in the given order, so a later field may read an
/// earlier one. A computation that is undefined for a record stores `Null`
/// for that record only.
pub fn derive(table: &Table, fields: &[DerivedField]) -> Result<Table, PipelineError> {
    let mut columns = table.columns().to_vec();
    for field in fields {
        for input in field.inputs() {
            if !columns.iter().any(|c| c == input) {
                return Err(PipelineError::Schema {
                    field: input.to_string(),
                    operation: "derive",
                });
            }
        }
        if !columns.contains(&field.name) {
            columns.push(field.name.clone());
        }
    }

    let records = table
        .records()
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let mut out = record.clone();
            for field in fields {
                let value = field.compute(&out).unwrap_or_else(|err| {
                    log::trace!("{}: record {i}: {err}", field.name);
                    Value::Null
                });
                out.set(&field.name, value);
            }
            out
        })
        .collect();

    Ok(Table::new(columns, records))
}

/// Convert a column to numbers, stripping currency decoration first.
/// Values that still don't parse become `Null`.
pub fn coerce_numeric(table: &Table, field: &str) -> Result<Table, PipelineError> {
    table.require_column(field, "coerce_numeric")?;
    Ok(map_column(table, field, |v| match v {
        Value::Integer(_) | Value::Float(_) => v.clone(),
        Value::Bool(b) => Value::Integer(i64::from(*b)),
        Value::String(s) => parse_number_lenient(s).map_or(Value::Null, Value::Float),
        Value::Date(_) | Value::Null => Value::Null,
    }))
}

/// Convert a column to dates. Values that don't parse become `Null`.
pub fn coerce_date(table: &Table, field: &str) -> Result<Table, PipelineError> {
    table.require_column(field, "coerce_date")?;
    Ok(map_column(table, field, |v| match v {
        Value::Date(_) => v.clone(),
        Value::String(s) => parse_date(s).map_or(Value::Null, Value::Date),
        _ => Value::Null,
    }))
}

fn map_column(table: &Table, field: &str, f: impl Fn(&Value) -> Value) -> Table {
    let records = table
        .records()
        .iter()
        .map(|record| {
            let mut out = record.clone();
            out.set(field, f(record.get(field)));
            out
        })
        .collect();
    table.with_records(records)
}
