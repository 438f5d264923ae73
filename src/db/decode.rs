use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Number, Value};
use sqlx::mysql::MySqlRow;
use sqlx::{Column, Row as _, TypeInfo, ValueRef};

use super::statement::Row;

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Decodes a MySQL row into JSON, column by column, by the server-reported type name.
///
/// Temporal values come back as `YYYY-MM-DD HH:MM:SS` strings, decimals as strings.
/// Unrecognized types fall back through integer, float, text and raw bytes.
pub(crate) fn decode_row(row: &MySqlRow) -> Row {
    let mut out = Row::with_capacity(row.columns().len());
    for (idx, column) in row.columns().iter().enumerate() {
        out.insert(column.name().to_string(), decode_column(row, idx));
    }
    out
}

/// How a column is read, chosen from its server-reported type name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decoding {
    Bool,
    Unsigned,
    Signed,
    Float,
    /// `DECIMAL`/`NUMERIC`, including `SUM` and `AVG` results; kept exact as text.
    Decimal,
    Timestamp,
    DateTime,
    Date,
    Other,
}

fn decoding_for(type_name: &str) -> Decoding {
    match type_name {
        "BOOLEAN" => Decoding::Bool,
        name if name.ends_with("UNSIGNED") => Decoding::Unsigned,
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "YEAR" => Decoding::Signed,
        "FLOAT" | "DOUBLE" => Decoding::Float,
        "DECIMAL" | "NUMERIC" => Decoding::Decimal,
        "TIMESTAMP" => Decoding::Timestamp,
        "DATETIME" => Decoding::DateTime,
        "DATE" => Decoding::Date,
        _ => Decoding::Other,
    }
}

fn decode_column(row: &MySqlRow, idx: usize) -> Value {
    let Ok(raw) = row.try_get_raw(idx) else {
        return Value::Null;
    };
    if raw.is_null() {
        return Value::Null;
    }
    let type_name = raw.type_info().name().to_ascii_uppercase();

    let decoded = match decoding_for(&type_name) {
        Decoding::Bool => row.try_get::<bool, _>(idx).ok().map(Value::Bool),
        Decoding::Unsigned => row
            .try_get::<u64, _>(idx)
            .ok()
            .map(|v| Value::Number(v.into())),
        Decoding::Signed => row
            .try_get::<i64, _>(idx)
            .ok()
            .map(|v| Value::Number(v.into())),
        Decoding::Float => row
            .try_get::<f64, _>(idx)
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number),
        // The server sends decimals as text in both protocols.
        Decoding::Decimal => row
            .try_get_unchecked::<String, _>(idx)
            .ok()
            .map(Value::String),
        Decoding::Timestamp => row
            .try_get::<DateTime<Utc>, _>(idx)
            .ok()
            .map(|v| Value::String(v.format(DATETIME_FORMAT).to_string())),
        Decoding::DateTime => row
            .try_get::<NaiveDateTime, _>(idx)
            .ok()
            .map(|v| Value::String(v.format(DATETIME_FORMAT).to_string())),
        Decoding::Date => row
            .try_get::<NaiveDate, _>(idx)
            .ok()
            .map(|v| Value::String(v.to_string())),
        Decoding::Other => None,
    };

    decoded.unwrap_or_else(|| fallback(row, idx))
}

fn fallback(row: &MySqlRow, idx: usize) -> Value {
    if let Ok(v) = row.try_get::<String, _>(idx) {
        return Value::String(v);
    }
    if let Ok(v) = row.try_get::<i64, _>(idx) {
        return Value::Number(v.into());
    }
    if let Ok(v) = row.try_get::<f64, _>(idx) {
        return Number::from_f64(v).map_or(Value::Null, Value::Number);
    }
    if let Ok(v) = row.try_get::<Vec<u8>, _>(idx) {
        return Value::String(String::from_utf8_lossy(&v).into_owned());
    }
    Value::Null
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_names_pick_their_decoding() {
        let cases = [
            ("BOOLEAN", Decoding::Bool),
            ("BIGINT UNSIGNED", Decoding::Unsigned),
            ("INT", Decoding::Signed),
            ("YEAR", Decoding::Signed),
            ("DOUBLE", Decoding::Float),
            ("DECIMAL", Decoding::Decimal),
            ("TIMESTAMP", Decoding::Timestamp),
            ("DATETIME", Decoding::DateTime),
            ("DATE", Decoding::Date),
            ("VARCHAR", Decoding::Other),
            ("JSON", Decoding::Other),
        ];
        for (name, expected) in cases {
            assert_eq!(decoding_for(name), expected, "{name}");
        }
    }
}
