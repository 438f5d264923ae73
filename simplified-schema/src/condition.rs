//! Declarative row filters.
//!
//! The JSON form accepted by [`Condition::parse`]:
//!
//! - `{"age": 18}`: implicit equality
//! - `{"age": {"$gt": 18}}`: one operator per key of the inner object
//! - `{"$and": [{..}, {..}]}` / `{"$or": {"a": 1, "b": 2}}`: combinators over an array of
//!   sub-conditions, or over an object whose fields are each one sub-condition
//!
//! Several top-level fields combine with an implicit AND. Operators are resolved here,
//! once, so compiling a parsed condition never fails.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value, json};

use crate::SchemaError;

/// Comparison applied to one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
    Ne,
    In,
    NotIn,
    Like,
    NotLike,
    Between,
}

impl Operator {
    pub fn from_token(token: &str) -> Option<Self> {
        let op = match token {
            "$gt" => Operator::Gt,
            "$gte" => Operator::Gte,
            "$lt" => Operator::Lt,
            "$lte" => Operator::Lte,
            "$not" => Operator::Ne,
            "$in" => Operator::In,
            "$notin" => Operator::NotIn,
            "$like" => Operator::Like,
            "$notlike" => Operator::NotLike,
            "$between" => Operator::Between,
            _ => return None,
        };
        Some(op)
    }

    /// DSL token; equality has none since it is written as a bare value.
    pub fn token(&self) -> Option<&'static str> {
        match self {
            Operator::Eq => None,
            Operator::Gt => Some("$gt"),
            Operator::Gte => Some("$gte"),
            Operator::Lt => Some("$lt"),
            Operator::Lte => Some("$lte"),
            Operator::Ne => Some("$not"),
            Operator::In => Some("$in"),
            Operator::NotIn => Some("$notin"),
            Operator::Like => Some("$like"),
            Operator::NotLike => Some("$notlike"),
            Operator::Between => Some("$between"),
        }
    }

    /// SQL emitted after the column name.
    pub fn placeholder(&self) -> &'static str {
        match self {
            Operator::Eq => "= ?",
            Operator::Gt => "> ?",
            Operator::Gte => ">= ?",
            Operator::Lt => "< ?",
            Operator::Lte => "<= ?",
            Operator::Ne => "!= ?",
            Operator::In => "IN (?)",
            Operator::NotIn => "NOT IN (?)",
            Operator::Like => "LIKE ?",
            Operator::NotLike => "NOT LIKE ?",
            Operator::Between => "BETWEEN ? AND ?",
        }
    }
}

/// Right-hand side of a comparison, shaped for its operator.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Scalar(Value),
    /// `IN`/`NOT IN`: bound as one list parameter.
    List(Vec<Value>),
    /// `BETWEEN`: two parameters.
    Range(Value, Value),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldPredicate {
    pub column: String,
    pub operator: Operator,
    pub operand: Operand,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Field(FieldPredicate),
    /// One leaf object with several fields: AND-joined, parenthesized when more than one.
    Group(Vec<Predicate>),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
}

impl Predicate {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(column, Operator::Eq, value)
    }

    /// Scalar comparison. Use [`Predicate::is_in`] and [`Predicate::between`] for the
    /// list and range operators.
    pub fn compare(column: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Predicate::Field(FieldPredicate {
            column: column.into(),
            operator,
            operand: Operand::Scalar(value.into()),
        })
    }

    pub fn is_in<I, V>(column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Predicate::Field(FieldPredicate {
            column: column.into(),
            operator: Operator::In,
            operand: Operand::List(values.into_iter().map(Into::into).collect()),
        })
    }

    pub fn not_in<I, V>(column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Predicate::Field(FieldPredicate {
            column: column.into(),
            operator: Operator::NotIn,
            operand: Operand::List(values.into_iter().map(Into::into).collect()),
        })
    }

    pub fn between(
        column: impl Into<String>,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> Self {
        Predicate::Field(FieldPredicate {
            column: column.into(),
            operator: Operator::Between,
            operand: Operand::Range(low.into(), high.into()),
        })
    }

    pub fn and(items: Vec<Predicate>) -> Self {
        Predicate::And(items)
    }

    pub fn or(items: Vec<Predicate>) -> Self {
        Predicate::Or(items)
    }

    fn to_canonical(&self) -> Value {
        match self {
            Predicate::Field(field) => {
                let value = match &field.operand {
                    Operand::Scalar(v) => v.clone(),
                    Operand::List(items) => Value::Array(items.clone()),
                    Operand::Range(low, high) => json!([low, high]),
                };
                json!({
                    "field": field.column,
                    "op": field.operator.placeholder(),
                    "value": value,
                })
            }
            Predicate::Group(items) => json!({"$group": canonical_list(items)}),
            Predicate::And(items) => json!({"$and": canonical_list(items)}),
            Predicate::Or(items) => json!({"$or": canonical_list(items)}),
        }
    }
}

/// Canonical forms of `items`, sorted: AND and OR do not depend on operand order.
fn canonical_list(items: &[Predicate]) -> Value {
    let mut canonical: Vec<Value> = items.iter().map(Predicate::to_canonical).collect();
    canonical.sort_by_cached_key(Value::to_string);
    Value::Array(canonical)
}

/// A parsed filter: top-level predicates joined with AND.
///
/// Serializes to a structural canonical form (used for cache keys), not back to the DSL.
/// Conditions that differ only in field order serialize identically.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Condition {
    predicates: Vec<Predicate>,
}

impl Condition {
    /// The empty condition; compiles to no WHERE clause.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn new(predicates: Vec<Predicate>) -> Self {
        Self { predicates }
    }

    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(vec![Predicate::eq(column, value)])
    }

    pub fn and_where(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Parses the JSON DSL. `null` and `{}` are the empty condition.
    pub fn parse(value: &Value) -> Result<Self, SchemaError> {
        match value {
            Value::Null => Ok(Self::all()),
            Value::Object(map) => Ok(Self {
                predicates: parse_terms(map)?,
            }),
            other => Err(malformed(format!(
                "expected an object at the top level, got {}",
                kind_of(other)
            ))),
        }
    }
}

impl TryFrom<Value> for Condition {
    type Error = SchemaError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Condition::parse(&value)
    }
}

impl From<Predicate> for Condition {
    fn from(predicate: Predicate) -> Self {
        Condition::new(vec![predicate])
    }
}

impl<'de> Deserialize<'de> for Condition {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Condition::parse(&value).map_err(serde::de::Error::custom)
    }
}

impl Serialize for Condition {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        canonical_list(&self.predicates).serialize(serializer)
    }
}

fn parse_terms(map: &Map<String, Value>) -> Result<Vec<Predicate>, SchemaError> {
    let mut predicates = Vec::with_capacity(map.len());
    for (key, value) in map {
        match key.as_str() {
            "$and" => predicates.push(Predicate::And(parse_combinator(key, value)?)),
            "$or" => predicates.push(Predicate::Or(parse_combinator(key, value)?)),
            column => predicates.extend(parse_field(column, value)?),
        }
    }
    Ok(predicates)
}

fn parse_combinator(key: &str, value: &Value) -> Result<Vec<Predicate>, SchemaError> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Object(map) => Ok(group(parse_terms(map)?)),
                other => Err(malformed(format!(
                    "{key} items must be objects, got {}",
                    kind_of(other)
                ))),
            })
            .collect(),
        Value::Object(map) => map
            .iter()
            .map(|(field, inner)| {
                let mut single = Map::new();
                single.insert(field.clone(), inner.clone());
                Ok(group(parse_terms(&single)?))
            })
            .collect(),
        other => Err(malformed(format!(
            "{key} expects an array or an object, got {}",
            kind_of(other)
        ))),
    }
}

fn group(mut items: Vec<Predicate>) -> Predicate {
    if items.len() == 1 {
        items.remove(0)
    } else {
        Predicate::Group(items)
    }
}

fn parse_field(column: &str, value: &Value) -> Result<Vec<Predicate>, SchemaError> {
    if column.starts_with('$') {
        return Err(malformed(format!("unknown combinator {column}")));
    }

    match value {
        Value::Object(ops) => {
            if ops.is_empty() {
                return Err(malformed(format!("{column}: empty operator object")));
            }
            ops.iter()
                .map(|(token, operand)| {
                    let operator = Operator::from_token(token).ok_or_else(|| {
                        malformed(format!("{column}: unknown operator {token}"))
                    })?;
                    Ok(Predicate::Field(FieldPredicate {
                        column: column.to_string(),
                        operator,
                        operand: parse_operand(column, operator, operand)?,
                    }))
                })
                .collect()
        }
        Value::Array(_) => Err(malformed(format!(
            "{column}: bare arrays are not allowed, use $in"
        ))),
        scalar => Ok(vec![Predicate::eq(column, scalar.clone())]),
    }
}

fn parse_operand(column: &str, operator: Operator, value: &Value) -> Result<Operand, SchemaError> {
    match operator {
        Operator::In | Operator::NotIn => match value {
            Value::Array(items) if !items.is_empty() && items.iter().all(is_scalar) => {
                Ok(Operand::List(items.clone()))
            }
            Value::Array(items) if items.is_empty() => {
                Err(malformed(format!("{column}: empty list for IN")))
            }
            _ => Err(malformed(format!("{column}: IN expects an array of scalars"))),
        },
        Operator::Between => match value {
            Value::Array(items) if items.len() == 2 && items.iter().all(is_scalar) => {
                Ok(Operand::Range(items[0].clone(), items[1].clone()))
            }
            _ => Err(malformed(format!(
                "{column}: BETWEEN expects exactly two values"
            ))),
        },
        _ if is_scalar(value) => Ok(Operand::Scalar(value.clone())),
        _ => Err(malformed(format!(
            "{column}: operator expects a scalar, got {}",
            kind_of(value)
        ))),
    }
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Array(_) | Value::Object(_))
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn malformed(message: String) -> SchemaError {
    SchemaError::MalformedCondition(message)
}
