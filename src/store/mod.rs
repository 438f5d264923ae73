//! Persisted table schemas.
//!
//! One row per managed table in `<prefix>table_structure`, keyed by the logical table name,
//! holding the JSON-serialized [`TableSchema`]. Reads go through the registry's schema cache;
//! every write clears the affected keys before and after touching the record, so a read
//! that overlapped the write cannot leave the old schema cached.

use std::sync::Arc;

use serde_json::Value;
use simplified_schema::TableSchema;
use tracing::debug;

use crate::db::{Database, Statement};
use crate::error::StoreError;
use crate::naming::TableNaming;
use crate::registry::Registry;

#[derive(Clone)]
pub struct SchemaStore<D> {
    db: D,
    registry: Arc<Registry>,
    naming: TableNaming,
}

impl<D: Database> SchemaStore<D> {
    pub fn new(db: D, registry: Arc<Registry>, naming: TableNaming) -> Self {
        Self {
            db,
            registry,
            naming,
        }
    }

    /// Creates the metadata table when missing.
    pub async fn create_metadata_table(&self) -> Result<(), StoreError> {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (`table` VARCHAR(100) NOT NULL PRIMARY KEY, `columns` LONGTEXT) {}",
            self.naming.metadata_table(),
            self.naming.table_options()
        );
        self.db.execute(Statement::new(sql)).await?;
        Ok(())
    }

    /// Stored schema of `table`, or [`StoreError::TableNotFound`].
    pub async fn get(&self, table: &str) -> Result<TableSchema, StoreError> {
        self.find(table)
            .await?
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))
    }

    /// Stored schema of `table`, if it has one.
    pub async fn find(&self, table: &str) -> Result<Option<TableSchema>, StoreError> {
        if let Some(schema) = self.registry.cached_schema(table) {
            return Ok(Some(schema));
        }
        let generation = self.registry.schema_generation();

        let stmt = Statement::new(format!(
            "SELECT `columns` FROM {} WHERE `table` = ? LIMIT 1",
            self.naming.metadata_table()
        ))
        .bind(table);

        let Some(row) = self.db.fetch(stmt).await?.into_iter().next() else {
            return Ok(None);
        };

        let schema: TableSchema = match row.get("columns") {
            Some(Value::String(text)) => serde_json::from_str(text)?,
            Some(Value::Null) | None => TableSchema::new(),
            Some(other) => serde_json::from_value(other.clone())?,
        };

        self.registry.cache_schema(table, schema.clone(), generation);
        Ok(Some(schema))
    }

    /// Records the schema of a newly created table.
    pub async fn put(&self, table: &str, schema: &TableSchema) -> Result<(), StoreError> {
        self.registry.forget_schema(table);

        let stmt = Statement::new(format!(
            "INSERT INTO {} (`table`, `columns`) VALUES (?, ?)",
            self.naming.metadata_table()
        ))
        .bind(table)
        .bind(serde_json::to_string(schema)?);

        self.db.execute(stmt).await?;
        self.registry.forget_schema(table);
        debug!(table, columns = schema.len(), "schema recorded");
        Ok(())
    }

    /// Replaces the record of `rename_from` (or `table` itself) with `schema` under `table`.
    pub async fn update(
        &self,
        table: &str,
        schema: &TableSchema,
        rename_from: Option<&str>,
    ) -> Result<(), StoreError> {
        let key = rename_from.unwrap_or(table);
        self.registry.forget_schema(key);
        self.registry.forget_schema(table);

        let stmt = Statement::new(format!(
            "UPDATE {} SET `table` = ?, `columns` = ? WHERE `table` = ?",
            self.naming.metadata_table()
        ))
        .bind(table)
        .bind(serde_json::to_string(schema)?)
        .bind(key);

        self.db.execute(stmt).await?;
        self.registry.forget_schema(key);
        self.registry.forget_schema(table);
        debug!(table, from = key, columns = schema.len(), "schema updated");
        Ok(())
    }

    pub async fn drop(&self, table: &str) -> Result<(), StoreError> {
        self.registry.forget_schema(table);

        let stmt = Statement::new(format!(
            "DELETE FROM {} WHERE `table` = ?",
            self.naming.metadata_table()
        ))
        .bind(table);

        self.db.execute(stmt).await?;
        self.registry.forget_schema(table);
        debug!(table, "schema record removed");
        Ok(())
    }

    /// Logical names of every recorded table, sorted.
    pub async fn list(&self) -> Result<Vec<String>, StoreError> {
        let stmt = Statement::new(format!(
            "SELECT `table` FROM {} ORDER BY `table`",
            self.naming.metadata_table()
        ));
        let rows = self.db.fetch(stmt).await?;
        Ok(rows
            .into_iter()
            .filter_map(|mut row| match row.remove("table") {
                Some(Value::String(name)) => Some(name),
                _ => None,
            })
            .collect())
    }

    pub fn naming(&self) -> &TableNaming {
        &self.naming
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn db(&self) -> &D {
        &self.db
    }
}
