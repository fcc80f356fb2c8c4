use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{
    Array, BooleanArray, Date32Array, Float32Array, Float64Array, Int32Array, Int64Array,
    LargeStringArray, StringArray,
};
use arrow::datatypes::DataType;
use chrono::{NaiveDate, NaiveDateTime};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::error::PipelineError;
use super::model::{Record, Table, Value, date_from_epoch_days};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row, one record per line
/// * `.json`    – `[{ "field": value, ... }, ...]`
/// * `.parquet` – flat scalar columns
///
/// Any failure is reported as [`PipelineError::Source`]; no partial table is returned.
pub fn load_file(path: &Path) -> Result<Table, PipelineError> {
    load_by_extension(path).map_err(|e| PipelineError::Source {
        path: path.to_path_buf(),
        reason: format!("{e:#}"),
    })
}

fn load_by_extension(path: &Path) -> Result<Table> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one record per row.
/// Cell types are guessed per cell, see [`guess_value`].
fn load_csv(path: &Path) -> Result<Table> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut records = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let row = result.with_context(|| format!("CSV row {row_no}"))?;

        let mut record = Record::default();
        for (col_idx, cell) in row.iter().enumerate() {
            record.set(&headers[col_idx], guess_value(cell));
        }
        records.push(record);
    }

    Ok(Table::new(headers, records))
}

/// Guess the type of a raw text cell.
///
/// Empty cells are `Null`; numbers (including currency-formatted ones such
/// as `$1,250.00`) become `Integer`/`Float`; `true`/`false` in any case
/// become `Bool`; anything else stays a `String`.
pub fn guess_value(raw: &str) -> Value {
    let s = raw.trim();
    if s.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return Value::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return Value::from(f);
    }
    if s.eq_ignore_ascii_case("true") || s.eq_ignore_ascii_case("false") {
        return Value::Bool(s.eq_ignore_ascii_case("true"));
    }
    if let Some(v) = strip_currency(s).and_then(|c| c.parse::<f64>().ok()) {
        return Value::from(v);
    }
    Value::String(s.to_string())
}

/// Normalise `-$1,234.50` style text into `-1234.50`.
///
/// Only well-formed amounts are accepted: an optional sign, an optional `$`,
/// digits with correctly placed thousands separators and an optional fraction.
fn strip_currency(s: &str) -> Option<String> {
    let (negative, rest) = match s.strip_prefix('-') {
        Some(r) => (true, r),
        None => (false, s),
    };
    let rest = rest.strip_prefix('$').unwrap_or(rest).trim_start();
    let (int_part, frac_part) = match rest.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (rest, None),
    };

    let groups: Vec<&str> = int_part.split(',').collect();
    let grouped_ok = groups.iter().enumerate().all(|(i, g)| {
        let digits = !g.is_empty() && g.bytes().all(|b| b.is_ascii_digit());
        match (i, groups.len()) {
            (_, 1) => digits,
            (0, _) => digits && g.len() <= 3,
            _ => digits && g.len() == 3,
        }
    });
    let frac_ok = frac_part.map_or(true, |f| !f.is_empty() && f.bytes().all(|b| b.is_ascii_digit()));
    if !grouped_ok || !frac_ok || (s == rest && groups.len() == 1) {
        return None;
    }

    let mut out = String::with_capacity(rest.len() + 1);
    if negative {
        out.push('-');
    }
    out.extend(int_part.chars().filter(|c| *c != ','));
    if let Some(f) = frac_part {
        out.push('.');
        out.push_str(f);
    }
    Some(out)
}

/// Lenient numeric coercion: strips `$`, thousands separators and whitespace
/// before parsing. Returns `None` for anything that still isn't a finite number.
pub fn parse_number_lenient(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| *c != '$' && *c != ',' && !c.is_whitespace())
        .collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%d-%b-%Y", "%Y/%m/%d"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Parse a date in one of the layouts commonly found in spreadsheet exports.
/// Month-only layouts (`2024-03`, `Mar-24`, `Mar 2024`) resolve to the first of the month.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    let first_of_month = format!("01 {}", s.replace('-', " "));
    ["%d %Y %m", "%d %b %y", "%d %b %Y", "%d %B %Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&first_of_month, fmt).ok())
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "name": "433 Eros", "hazardous": false, "est_diameter_min": 16.8 },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<Table> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let rows = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut columns: Vec<String> = Vec::new();
    let mut records = Vec::with_capacity(rows.len());

    for (i, row) in rows.iter().enumerate() {
        let obj = row
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        let mut record = Record::default();
        for (key, val) in obj {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
            record.set(key, json_to_value(val));
        }
        records.push(record);
    }

    Ok(Table::new(columns, records))
}

fn json_to_value(val: &JsonValue) -> Value {
    match val {
        JsonValue::String(s) => guess_value(s),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else if let Some(f) = n.as_f64() {
                Value::from(f)
            } else {
                Value::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Null => Value::Null,
        other => Value::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with flat scalar columns (strings, ints, floats,
/// bools, `Date32`). Works with files written by both **Pandas**
/// (`df.to_parquet()`) and **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<Table> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut records = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for row in 0..batch.num_rows() {
            let mut record = Record::default();
            for (col_idx, col_name) in columns.iter().enumerate() {
                record.set(col_name, extract_value(batch.column(col_idx), row));
            }
            records.push(record);
        }
    }

    Ok(Table::new(columns, records))
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_value(col: &Arc<dyn Array>, row: usize) -> Value {
    if col.is_null(row) {
        return Value::Null;
    }
    let any = col.as_any();
    let value = match col.data_type() {
        DataType::Utf8 => any
            .downcast_ref::<StringArray>()
            .map(|a| guess_value(a.value(row))),
        DataType::LargeUtf8 => any
            .downcast_ref::<LargeStringArray>()
            .map(|a| guess_value(a.value(row))),
        DataType::Int32 => any
            .downcast_ref::<Int32Array>()
            .map(|a| Value::Integer(i64::from(a.value(row)))),
        DataType::Int64 => any
            .downcast_ref::<Int64Array>()
            .map(|a| Value::Integer(a.value(row))),
        DataType::Float32 => any
            .downcast_ref::<Float32Array>()
            .map(|a| Value::from(f64::from(a.value(row)))),
        DataType::Float64 => any
            .downcast_ref::<Float64Array>()
            .map(|a| Value::from(a.value(row))),
        DataType::Boolean => any
            .downcast_ref::<BooleanArray>()
            .map(|a| Value::Bool(a.value(row))),
        DataType::Date32 => any
            .downcast_ref::<Date32Array>()
            .and_then(|a| date_from_epoch_days(i64::from(a.value(row))))
            .map(Value::Date),
        other => Some(Value::String(format!("{other:?}"))),
    };
    value.unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_temp(ext: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(ext)
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn guesses_cell_types() {
        assert_eq!(guess_value(""), Value::Null);
        assert_eq!(guess_value("42"), Value::Integer(42));
        assert_eq!(guess_value("0.25"), Value::Float(0.25));
        assert_eq!(guess_value("True"), Value::Bool(true));
        assert_eq!(guess_value("false"), Value::Bool(false));
        assert_eq!(guess_value("$1,250.00"), Value::Float(1250.0));
        assert_eq!(guess_value("-$5"), Value::Float(-5.0));
        assert_eq!(guess_value("1,000"), Value::Float(1000.0));
        assert_eq!(guess_value("NaN"), Value::Null);
        assert_eq!(guess_value("Apollo"), Value::from("Apollo"));
        assert_eq!(guess_value("Smith, John"), Value::from("Smith, John"));
        assert_eq!(guess_value("1,2"), Value::from("1,2"));
    }

    #[test]
    fn lenient_number_parsing() {
        assert_eq!(parse_number_lenient("$ 12,000.5"), Some(12000.5));
        assert_eq!(parse_number_lenient("n/a"), None);
        assert_eq!(parse_number_lenient("inf"), None);
    }

    #[test]
    fn parses_common_date_layouts() {
        let march = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(parse_date("2024-03-01"), Some(march));
        assert_eq!(parse_date("3/1/2024"), Some(march));
        assert_eq!(parse_date("2024-03"), Some(march));
        assert_eq!(parse_date("Mar-24"), Some(march));
        assert_eq!(parse_date("Mar 2024"), Some(march));
        assert_eq!(parse_date("2024-03-01 00:00:00"), Some(march));
        assert_eq!(parse_date("soon"), None);
    }

    #[test]
    fn loads_csv_in_file_order() {
        let file = write_temp(
            ".csv",
            "name,hazardous,est_diameter_min\nEros,False,16.8\nApophis,True,0.37\n",
        );
        let table = load_file(file.path()).unwrap();
        assert_eq!(
            table.columns(),
            &["name".to_string(), "hazardous".into(), "est_diameter_min".into()]
        );
        assert_eq!(table.len(), 2);
        assert_eq!(table.records()[0].get("name"), &Value::from("Eros"));
        assert_eq!(table.records()[1].get("hazardous"), &Value::Bool(true));
        assert_eq!(table.records()[1].number("est_diameter_min"), Some(0.37));
    }

    #[test]
    fn loads_json_records() {
        let file = write_temp(
            ".json",
            r#"[{"TopGrp": "Parts", "Total Revenue": "$1,000"}, {"TopGrp": "Labor", "Total Revenue": 5}]"#,
        );
        let table = load_file(file.path()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.records()[0].number("Total Revenue"), Some(1000.0));
        assert_eq!(table.records()[1].get("Total Revenue"), &Value::Integer(5));
    }

    #[test]
    fn loads_parquet_columns() {
        use arrow::array::ArrayRef;
        use arrow::datatypes::{Field, Schema};
        use arrow::record_batch::RecordBatch;
        use parquet::arrow::ArrowWriter;

        let schema = Arc::new(Schema::new(vec![
            Field::new("TopGrp", DataType::Utf8, false),
            Field::new("rev", DataType::Float64, true),
            Field::new("hazardous", DataType::Boolean, false),
            Field::new("Period", DataType::Date32, false),
        ]));
        let columns: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from(vec!["$1,000", "Parts", "7"])),
            Arc::new(Float64Array::from(vec![Some(f64::NAN), None, Some(2.5)])),
            Arc::new(BooleanArray::from(vec![true, false, true])),
            Arc::new(Date32Array::from(vec![19_723, -1, 0])),
        ];
        let batch = RecordBatch::try_new(schema.clone(), columns).unwrap();

        let file = tempfile::Builder::new()
            .suffix(".parquet")
            .tempfile()
            .unwrap();
        let out = std::fs::File::create(file.path()).unwrap();
        let mut writer = ArrowWriter::try_new(out, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let table = load_file(file.path()).unwrap();
        assert_eq!(
            table.columns(),
            &["TopGrp".to_string(), "rev".into(), "hazardous".into(), "Period".into()]
        );
        let rows = table.records();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].get("TopGrp"), &Value::Float(1000.0));
        assert_eq!(rows[1].get("TopGrp"), &Value::from("Parts"));
        assert_eq!(rows[2].get("TopGrp"), &Value::Integer(7));
        assert_eq!(rows[0].get("rev"), &Value::Null);
        assert_eq!(rows[1].get("rev"), &Value::Null);
        assert_eq!(rows[2].get("rev"), &Value::Float(2.5));
        assert_eq!(rows[1].get("hazardous"), &Value::Bool(false));
        let date = |y, m, d| Value::Date(NaiveDate::from_ymd_opt(y, m, d).unwrap());
        assert_eq!(rows[0].get("Period"), &date(2024, 1, 1));
        assert_eq!(rows[1].get("Period"), &date(1969, 12, 31));
        assert_eq!(rows[2].get("Period"), &date(1970, 1, 1));
    }

    #[test]
    fn missing_file_is_a_source_error() {
        let err = load_file(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, PipelineError::Source { .. }));
    }

    #[test]
    fn ragged_csv_is_a_source_error() {
        let file = write_temp(".csv", "a,b\n1,2\n3\n");
        let err = load_file(file.path()).unwrap_err();
        assert!(matches!(err, PipelineError::Source { .. }));
    }

    #[test]
    fn unsupported_extension_is_a_source_error() {
        let file = write_temp(".xlsx", "");
        let err = load_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("Unsupported file extension"));
    }
}
