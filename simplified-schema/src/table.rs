use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::SchemaError;
use crate::column::ColumnDefinition;

/// Column name -> definition, in DDL order.
///
/// Order only affects the order of generated column clauses; equality compares content.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableSchema {
    columns: IndexMap<String, ColumnDefinition>,
}

impl TableSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert; a repeated name replaces the earlier definition in place.
    pub fn with_column(mut self, name: impl Into<String>, def: ColumnDefinition) -> Self {
        self.columns.insert(name.into(), def);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, def: ColumnDefinition) {
        self.columns.insert(name.into(), def);
    }

    pub fn remove(&mut self, name: &str) -> Option<ColumnDefinition> {
        self.columns.shift_remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ColumnDefinition)> {
        self.columns.iter().map(|(name, def)| (name.as_str(), def))
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Columns flagged for the secondary index, in schema order.
    pub fn indexed_columns(&self) -> impl Iterator<Item = &str> {
        self.iter().filter(|(_, def)| def.index).map(|(name, _)| name)
    }

    /// The auto-increment column, if any.
    pub fn auto_increment_column(&self) -> Option<&str> {
        self.iter()
            .find(|(_, def)| def.auto_increment)
            .map(|(name, _)| name)
    }

    /// Checks the per-table invariants: at most one primary column, auto-increment only
    /// on an integer primary column, and enum columns carrying their values.
    pub fn validate(&self) -> Result<(), SchemaError> {
        let primaries: Vec<&str> = self
            .iter()
            .filter(|(_, def)| def.primary)
            .map(|(name, _)| name)
            .collect();
        if primaries.len() > 1 {
            return Err(SchemaError::InvalidSchema(format!(
                "only one primary column is allowed, found {}",
                primaries.join(", ")
            )));
        }

        for (name, def) in self.iter() {
            if name.trim().is_empty() {
                return Err(SchemaError::InvalidSchema(
                    "column names must not be empty".to_string(),
                ));
            }
            if def.auto_increment && !(def.primary && def.kind.is_integer()) {
                return Err(SchemaError::InvalidSchema(format!(
                    "{name}: autoIncrement requires an integer primary column"
                )));
            }
            if def.kind == crate::ColumnKind::Enum && def.enum_values.is_empty() {
                return Err(SchemaError::InvalidSchema(format!(
                    "{name}: enum columns need at least one value"
                )));
            }
        }
        Ok(())
    }

    /// Computes what it takes to turn `self` (the stored shape) into `desired`.
    pub fn diff(&self, desired: &TableSchema) -> SchemaDiff {
        let mut diff = SchemaDiff::default();

        for (name, def) in desired.iter() {
            match self.get(name) {
                None => diff.added.insert(name, def.clone()),
                Some(current) if current != def => diff.changed.insert(name, def.clone()),
                Some(_) => {}
            }
        }

        diff.dropped = self
            .column_names()
            .filter(|name| !desired.contains(name))
            .map(str::to_string)
            .collect();

        diff
    }

    /// Applies a diff: added columns appended, changed columns replaced where they exist,
    /// dropped columns removed.
    pub fn merge(&self, diff: &SchemaDiff) -> TableSchema {
        let mut merged = self.clone();
        for (name, def) in diff.added.iter() {
            merged.insert(name, def.clone());
        }
        for (name, def) in diff.changed.iter() {
            if let Some(slot) = merged.columns.get_mut(name) {
                *slot = def.clone();
            }
        }
        for name in &diff.dropped {
            merged.remove(name);
        }
        merged
    }
}

impl<S: Into<String>> FromIterator<(S, ColumnDefinition)> for TableSchema {
    fn from_iter<T: IntoIterator<Item = (S, ColumnDefinition)>>(iter: T) -> Self {
        Self {
            columns: iter
                .into_iter()
                .map(|(name, def)| (name.into(), def))
                .collect(),
        }
    }
}

/// Added, changed and dropped columns between a stored and a desired schema.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SchemaDiff {
    pub added: TableSchema,
    pub changed: TableSchema,
    pub dropped: Vec<String>,
}

impl SchemaDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.changed.is_empty() && self.dropped.is_empty()
    }
}
