pub mod column;
pub mod condition;
pub mod table;

use thiserror::Error as ThisError;

pub use column::{ColumnDefinition, ColumnKind};
pub use condition::{Condition, FieldPredicate, Operand, Operator, Predicate};
pub use table::{SchemaDiff, TableSchema};

/// Errors raised while validating a schema or parsing a condition.
///
/// Both are detected before any SQL is built.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum SchemaError {
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    #[error("Malformed condition: {0}")]
    MalformedCondition(String),
}
