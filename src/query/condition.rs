use serde_json::Value;
use simplified_schema::{Condition, FieldPredicate, Operand, Predicate};

use crate::db::quote_ident;

/// A WHERE fragment (without the `WHERE` keyword) and its parameters in placeholder order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompiledCondition {
    pub clause: String,
    pub params: Vec<Value>,
}

impl CompiledCondition {
    pub fn is_empty(&self) -> bool {
        self.clause.is_empty()
    }
}

/// Compiles a condition into SQL. Columns are qualified with `alias` when given.
///
/// List operands are bound as one array parameter; the statement layer expands them.
pub fn compile(condition: &Condition, alias: Option<&str>) -> CompiledCondition {
    let mut params = Vec::new();
    let clauses: Vec<String> = condition
        .predicates()
        .iter()
        .filter_map(|p| compile_predicate(p, alias, &mut params))
        .collect();

    CompiledCondition {
        clause: clauses.join(" AND "),
        params,
    }
}

fn compile_predicate(
    predicate: &Predicate,
    alias: Option<&str>,
    params: &mut Vec<Value>,
) -> Option<String> {
    match predicate {
        Predicate::Field(field) => Some(compile_field(field, alias, params)),
        Predicate::Group(items) => {
            let mut parts = compile_all(items, alias, params);
            match parts.len() {
                0 => None,
                1 => parts.pop(),
                _ => Some(format!("({})", parts.join(" AND "))),
            }
        }
        Predicate::And(items) => join_wrapped(compile_all(items, alias, params), " AND "),
        Predicate::Or(items) => join_wrapped(compile_all(items, alias, params), " OR "),
    }
}

fn compile_all(items: &[Predicate], alias: Option<&str>, params: &mut Vec<Value>) -> Vec<String> {
    items
        .iter()
        .filter_map(|p| compile_predicate(p, alias, params))
        .collect()
}

fn join_wrapped(parts: Vec<String>, separator: &str) -> Option<String> {
    if parts.is_empty() {
        return None;
    }
    Some(format!("({})", parts.join(separator)))
}

fn compile_field(field: &FieldPredicate, alias: Option<&str>, params: &mut Vec<Value>) -> String {
    match &field.operand {
        Operand::Scalar(value) => params.push(value.clone()),
        Operand::List(items) => params.push(Value::Array(items.clone())),
        Operand::Range(low, high) => {
            params.push(low.clone());
            params.push(high.clone());
        }
    }
    format!(
        "{} {}",
        qualified(alias, &field.column),
        field.operator.placeholder()
    )
}

/// `` `col` `` or `` `alias`.`col` ``.
pub fn qualified(alias: Option<&str>, column: &str) -> String {
    match alias {
        Some(alias) => format!("{}.{}", quote_ident(alias), quote_ident(column)),
        None => quote_ident(column),
    }
}
