//! Creating, evolving, renaming and dropping managed tables.
//!
//! Each operation issues its DDL first and writes the schema record second. The two steps
//! are separate statements: if the record write fails after the DDL went through, the live
//! table and its record disagree until the next successful migration of that table.
//! A [`MigrationEvent`] handler that fails afterwards does not fail the migration.

pub mod ddl;

use serde::Serialize;
use simplified_schema::{SchemaDiff, TableSchema};
use tracing::{debug, info, warn};

use crate::db::{Database, Statement};
use crate::error::StoreError;
use crate::store::SchemaStore;
use crate::utils::logging::with_pretty_json_debug;

/// Fired after every successful DDL path.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MigrationEvent {
    Created { table: String },
    Altered { table: String, diff: SchemaDiff },
    Renamed { from: String, to: String },
    Dropped { table: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Created,
    Altered,
    Unchanged,
}

#[derive(Clone)]
pub struct Migrator<D> {
    store: SchemaStore<D>,
}

impl<D: Database> Migrator<D> {
    pub fn new(store: SchemaStore<D>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &SchemaStore<D> {
        &self.store
    }

    pub async fn create_table(&self, table: &str, schema: &TableSchema) -> Result<(), StoreError> {
        schema.validate()?;

        let sql = ddl::create_table(self.store.naming(), table, schema);
        self.store.db().execute(Statement::new(sql)).await?;
        info!(table, columns = schema.len(), "table created");

        self.store.put(table, schema).await?;
        self.finish(
            &[table],
            &MigrationEvent::Created {
                table: table.to_string(),
            },
        );
        Ok(())
    }

    /// Brings `table` to `desired`: creates it when unrecorded, alters it when the recorded
    /// schema differs, does nothing otherwise.
    pub async fn reconcile(
        &self,
        table: &str,
        desired: &TableSchema,
    ) -> Result<ReconcileOutcome, StoreError> {
        desired.validate()?;

        let Some(stored) = self.store.find(table).await? else {
            self.create_table(table, desired).await?;
            return Ok(ReconcileOutcome::Created);
        };

        let diff = stored.diff(desired);
        if diff.is_empty() {
            debug!(table, "schema unchanged");
            return Ok(ReconcileOutcome::Unchanged);
        }

        self.apply_diff(table, &stored, diff).await?;
        Ok(ReconcileOutcome::Altered)
    }

    /// Applies an explicit diff against the recorded schema of `table`.
    pub async fn update_table(
        &self,
        table: &str,
        added: TableSchema,
        changed: TableSchema,
        dropped: Vec<String>,
    ) -> Result<(), StoreError> {
        let stored = self.store.get(table).await?;
        let diff = SchemaDiff {
            added,
            changed,
            dropped,
        };
        self.apply_diff(table, &stored, diff).await
    }

    async fn apply_diff(
        &self,
        table: &str,
        stored: &TableSchema,
        diff: SchemaDiff,
    ) -> Result<(), StoreError> {
        let merged = stored.merge(&diff);
        merged.validate()?;

        with_pretty_json_debug(&diff, |pretty| {
            debug!(table, diff = %pretty, "applying schema diff");
        });

        let naming = self.store.naming();
        for sql in ddl::drop_indexes(naming, table, stored, &diff.dropped) {
            if let Err(err) = self.store.db().execute(Statement::new(sql)).await {
                warn!(table, error = %err, "drop index failed; continuing");
            }
        }

        if let Some(sql) = ddl::alter_table(naming, table, stored, &diff) {
            self.store.db().execute(Statement::new(sql)).await?;
            info!(
                table,
                added = diff.added.len(),
                changed = diff.changed.len(),
                dropped = diff.dropped.len(),
                "table altered"
            );
        }

        self.store.update(table, &merged, None).await?;
        self.finish(
            &[table],
            &MigrationEvent::Altered {
                table: table.to_string(),
                diff,
            },
        );
        Ok(())
    }

    pub async fn rename_table(&self, from: &str, to: &str) -> Result<(), StoreError> {
        let schema = self.store.get(from).await?;

        let sql = ddl::rename_table(self.store.naming(), from, to);
        self.store.db().execute(Statement::new(sql)).await?;
        info!(from, to, "table renamed");

        self.store.update(to, &schema, Some(from)).await?;
        self.finish(
            &[from, to],
            &MigrationEvent::Renamed {
                from: from.to_string(),
                to: to.to_string(),
            },
        );
        Ok(())
    }

    pub async fn drop_table(&self, table: &str) -> Result<(), StoreError> {
        let sql = ddl::drop_table(self.store.naming(), table);
        self.store.db().execute(Statement::new(sql)).await?;
        info!(table, "table dropped");

        self.store.drop(table).await?;
        self.finish(
            &[table],
            &MigrationEvent::Dropped {
                table: table.to_string(),
            },
        );
        Ok(())
    }

    /// Runs once the DDL and the record write have both landed. Handler failures are logged
    /// and swallowed: the migration itself is already committed.
    fn finish(&self, tables: &[&str], event: &MigrationEvent) {
        let registry = self.store.registry();
        for table in tables {
            registry.forget_rows(table);
        }
        if let Err(err) = registry.migration_events().trigger(event) {
            warn!(error = %err, "migration event handler failed");
        }
    }
}
