use std::sync::Arc;

use serde_json::{Map, Value};
use simplified_schema::{Condition, TableSchema};

use crate::compose::{Composer, TypeDescriptor};
use crate::db::{Database, Row, Statement};
use crate::error::StoreError;
use crate::install::install_core_tables;
use crate::migrate::{Migrator, ReconcileOutcome};
use crate::naming::TableNaming;
use crate::query::{Executor, InsertOutcome, JoinQuery, JoinTable, QueryResult, SelectQuery};
use crate::registry::Registry;
use crate::store::SchemaStore;

/// Entry point for callers: table lifecycle, row access and content-type tables over one
/// backend and one registry.
#[derive(Clone)]
pub struct ContentStore<D> {
    registry: Arc<Registry>,
    migrator: Migrator<D>,
    executor: Executor<D>,
    composer: Composer<D>,
}

impl<D: Database + Clone> ContentStore<D> {
    pub fn new(db: D, registry: Arc<Registry>, naming: TableNaming) -> Self {
        let store = SchemaStore::new(db, Arc::clone(&registry), naming);
        let migrator = Migrator::new(store.clone());
        Self {
            registry,
            executor: Executor::new(store),
            composer: Composer::new(migrator.clone()),
            migrator,
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn naming(&self) -> &TableNaming {
        self.migrator.store().naming()
    }

    pub async fn install_core_tables(&self) -> Result<(), StoreError> {
        install_core_tables(&self.migrator).await
    }

    // Table lifecycle

    pub async fn create_table(&self, table: &str, schema: &TableSchema) -> Result<(), StoreError> {
        self.migrator.create_table(table, schema).await
    }

    pub async fn reconcile(
        &self,
        table: &str,
        desired: &TableSchema,
    ) -> Result<ReconcileOutcome, StoreError> {
        self.migrator.reconcile(table, desired).await
    }

    pub async fn update_table(
        &self,
        table: &str,
        added: TableSchema,
        changed: TableSchema,
        dropped: Vec<String>,
    ) -> Result<(), StoreError> {
        self.migrator
            .update_table(table, added, changed, dropped)
            .await
    }

    pub async fn rename_table(&self, from: &str, to: &str) -> Result<(), StoreError> {
        self.migrator.rename_table(from, to).await
    }

    pub async fn drop_table(&self, table: &str) -> Result<(), StoreError> {
        self.migrator.drop_table(table).await
    }

    pub async fn get_table_structure(&self, table: &str) -> Result<TableSchema, StoreError> {
        self.migrator.store().get(table).await
    }

    pub async fn list_tables(&self) -> Result<Vec<String>, StoreError> {
        self.migrator.store().list().await
    }

    // Rows

    pub async fn insert(
        &self,
        table: &str,
        row: Map<String, Value>,
    ) -> Result<InsertOutcome, StoreError> {
        self.executor.insert(table, row).await
    }

    pub async fn update(
        &self,
        table: &str,
        partial: Map<String, Value>,
        condition: &Condition,
    ) -> Result<u64, StoreError> {
        self.executor.update(table, partial, condition).await
    }

    pub async fn delete(
        &self,
        table: &str,
        condition: &Condition,
        offset: Option<u64>,
        limit: Option<u64>,
    ) -> Result<u64, StoreError> {
        self.executor.delete(table, condition, offset, limit).await
    }

    pub async fn get(&self, query: &SelectQuery) -> Result<QueryResult, StoreError> {
        self.executor.get(query).await
    }

    pub async fn get_row(&self, query: &SelectQuery) -> Result<Row, StoreError> {
        self.executor.get_row(query).await
    }

    pub async fn get_value(
        &self,
        query: &SelectQuery,
        column: &str,
        fallback: Value,
    ) -> Result<Value, StoreError> {
        self.executor.get_value(query, column, fallback).await
    }

    pub async fn select_cached(&self, query: &SelectQuery) -> Result<QueryResult, StoreError> {
        self.executor.select_cached(query).await
    }

    pub async fn raw_query(&self, statement: Statement) -> Result<Vec<Row>, StoreError> {
        self.executor.raw_query(statement).await
    }

    pub async fn join(&self, query: &JoinQuery) -> Result<Vec<Row>, StoreError> {
        self.executor.join(query).await
    }

    pub async fn left_join(&self, tables: Vec<JoinTable>) -> Result<Vec<Row>, StoreError> {
        self.executor.join(&JoinQuery::left(tables)).await
    }

    pub async fn right_join(&self, tables: Vec<JoinTable>) -> Result<Vec<Row>, StoreError> {
        self.executor.join(&JoinQuery::right(tables)).await
    }

    // Content-type tables

    pub async fn install_type(&self, descriptor: &TypeDescriptor) -> Result<(), StoreError> {
        self.composer.install(descriptor).await
    }

    pub async fn update_type(
        &self,
        new: &TypeDescriptor,
        old: &TypeDescriptor,
    ) -> Result<(), StoreError> {
        self.composer.update(new, old).await
    }

    pub async fn uninstall_type(&self, descriptor: &TypeDescriptor) -> Result<(), StoreError> {
        self.composer.uninstall(descriptor).await
    }
}
