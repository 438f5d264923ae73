use chrono::Utc;
use serde_json::{Map, Value};
use simplified_schema::{Condition, TableSchema};

use crate::db::{Statement, quote_ident};
use crate::error::StoreError;
use crate::naming::TableNaming;
use crate::query::coerce::encode;
use crate::query::condition::compile;

const STAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Result of an insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Generated auto-increment id.
    Id(u64),
    /// The table has no auto-increment column.
    Inserted,
}

impl InsertOutcome {
    pub fn id(&self) -> Option<u64> {
        match self {
            InsertOutcome::Id(id) => Some(*id),
            InsertOutcome::Inserted => None,
        }
    }
}

/// Validates and encodes a row against the schema, in schema column order.
///
/// Unknown columns are dropped. Auto-stamped timestamp columns missing from `row` get the
/// current UTC time.
pub fn prepare_insert(
    schema: &TableSchema,
    mut row: Map<String, Value>,
) -> Result<Map<String, Value>, StoreError> {
    let now = Utc::now().format(STAMP_FORMAT).to_string();
    let mut out = Map::with_capacity(schema.len());

    for (column, def) in schema.iter() {
        match row.remove(column) {
            Some(value) if !value.is_null() => {
                out.insert(column.to_string(), encode(def, value));
            }
            supplied => {
                if def.must_be_supplied() {
                    return Err(StoreError::validation(format!("{column} is required")));
                }
                if def.is_auto_stamped() {
                    out.insert(column.to_string(), Value::String(now.clone()));
                } else if let Some(null) = supplied {
                    out.insert(column.to_string(), null);
                }
            }
        }
    }

    Ok(out)
}

/// Encodes only the supplied known columns.
pub fn prepare_update(
    schema: &TableSchema,
    partial: Map<String, Value>,
) -> Result<Map<String, Value>, StoreError> {
    let out: Map<String, Value> = partial
        .into_iter()
        .filter_map(|(column, value)| {
            let def = schema.get(&column)?;
            Some((column, encode(def, value)))
        })
        .collect();

    if out.is_empty() {
        return Err(StoreError::validation("no known columns to update"));
    }
    Ok(out)
}

pub fn insert_statement(naming: &TableNaming, table: &str, row: Map<String, Value>) -> Statement {
    let columns: Vec<String> = row.keys().map(|c| quote_ident(c)).collect();
    let marks = vec!["?"; columns.len()].join(", ");
    let params = row.into_iter().map(|(_, v)| v).collect();

    Statement::with_params(
        format!(
            "INSERT INTO {} ({}) VALUES ({marks})",
            naming.quoted(table),
            columns.join(", ")
        ),
        params,
    )
}

/// `UPDATE … SET … WHERE …`. An empty condition is refused rather than updating every row.
pub fn update_statement(
    naming: &TableNaming,
    table: &str,
    values: Map<String, Value>,
    condition: &Condition,
) -> Result<Statement, StoreError> {
    let physical = naming.physical(table);
    let compiled = compile(condition, Some(&physical));
    if compiled.is_empty() {
        return Err(StoreError::validation("update requires a condition"));
    }

    let assignments: Vec<String> = values
        .keys()
        .map(|c| format!("{} = ?", quote_ident(c)))
        .collect();
    let mut params: Vec<Value> = values.into_iter().map(|(_, v)| v).collect();
    params.extend(compiled.params);

    Ok(Statement::with_params(
        format!(
            "UPDATE {} SET {} WHERE {}",
            quote_ident(&physical),
            assignments.join(", "),
            compiled.clause
        ),
        params,
    ))
}

/// `DELETE FROM … [WHERE …] [LIMIT …]`. A zero or missing limit deletes every match; a
/// positive offset is passed through as `LIMIT offset, limit`.
pub fn delete_statement(
    naming: &TableNaming,
    table: &str,
    condition: &Condition,
    offset: Option<u64>,
    limit: Option<u64>,
) -> Statement {
    let physical = naming.physical(table);
    let mut sql = format!("DELETE FROM {}", quote_ident(&physical));

    let compiled = compile(condition, Some(&physical));
    if !compiled.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&compiled.clause);
    }

    match (offset.unwrap_or(0), limit.unwrap_or(0)) {
        (_, 0) => {}
        (0, limit) => sql.push_str(&format!(" LIMIT {limit}")),
        (offset, limit) => sql.push_str(&format!(" LIMIT {offset}, {limit}")),
    }

    Statement::with_params(sql, compiled.params)
}
