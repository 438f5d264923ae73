//! Value conversion between callers and storage, driven by column kinds.

use serde_json::Value;
use simplified_schema::{ColumnDefinition, ColumnKind, TableSchema};

use crate::db::Row;

/// Storage form of one supplied value: JSON text for object/array columns, 0/1 for bool.
pub fn encode(def: &ColumnDefinition, value: Value) -> Value {
    match def.kind {
        _ if value.is_null() => value,
        ColumnKind::Object | ColumnKind::Array => match value {
            Value::String(_) => value,
            other => Value::String(other.to_string()),
        },
        ColumnKind::Bool => Value::from(u8::from(truthy(&value))),
        _ => value,
    }
}

/// Restores caller-facing values in fetched rows: JSON columns decoded (text that does not
/// parse is left as-is) and bool columns turned into booleans. Unknown columns pass through.
pub fn decode_rows(schema: &TableSchema, rows: &mut [Row]) {
    for row in rows.iter_mut() {
        for (column, value) in row.iter_mut() {
            let Some(def) = schema.get(column) else {
                continue;
            };
            decode_value(def, value);
        }
    }
}

fn decode_value(def: &ColumnDefinition, value: &mut Value) {
    match def.kind {
        ColumnKind::Object | ColumnKind::Array => {
            if let Value::String(text) = value {
                if let Ok(parsed) = serde_json::from_str::<Value>(text) {
                    *value = parsed;
                }
            }
        }
        ColumnKind::Bool => *value = Value::Bool(truthy(value)),
        _ => {}
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !(s.is_empty() || s == "0" || s.eq_ignore_ascii_case("false")),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
