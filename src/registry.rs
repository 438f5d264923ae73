use std::sync::Arc;

use simplified_cache::{CacheKey, KeyedCache};
use simplified_schema::TableSchema;

use crate::compose::TableContext;
use crate::hooks::{EventHandler, EventPipeline, FilterHandler, FilterPipeline};
use crate::migrate::MigrationEvent;
use crate::query::QueryResult;

const SCHEMA_GROUP: &str = "schema";

/// Process-wide state shared by every component: the caches and the hook pipelines.
///
/// Built once at startup and handed around as `Arc<Registry>`.
#[derive(Debug)]
pub struct Registry {
    schemas: KeyedCache<TableSchema>,
    rows: KeyedCache<QueryResult>,
    table_filters: FilterPipeline<TableSchema, TableContext>,
    migration_events: EventPipeline<MigrationEvent>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    pub fn cached_schema(&self, table: &str) -> Option<TableSchema> {
        self.schemas.get(SCHEMA_GROUP, table)
    }

    /// Generation of the schema cache; read it before fetching a record.
    pub fn schema_generation(&self) -> u64 {
        self.schemas.generation(SCHEMA_GROUP)
    }

    /// Memoizes `schema` unless a schema write happened since `generation` was read.
    pub fn cache_schema(&self, table: &str, schema: TableSchema, generation: u64) -> bool {
        self.schemas
            .set_if_unchanged(SCHEMA_GROUP, CacheKey::from(table), schema, generation)
    }

    pub fn forget_schema(&self, table: &str) {
        self.schemas.clear(SCHEMA_GROUP, table);
    }

    pub fn cached_rows(&self, table: &str, key: &str) -> Option<QueryResult> {
        self.rows.get(&rows_group(table), key)
    }

    pub fn rows_generation(&self, table: &str) -> u64 {
        self.rows.generation(&rows_group(table))
    }

    /// Memoizes `result` unless `table` was written since `generation` was read.
    pub fn cache_rows(
        &self,
        table: &str,
        key: CacheKey,
        result: QueryResult,
        generation: u64,
    ) -> bool {
        self.rows
            .set_if_unchanged(&rows_group(table), key, result, generation)
    }

    /// Drops every memoized query against `table`.
    pub fn forget_rows(&self, table: &str) {
        self.rows.clear_group(&rows_group(table));
    }

    pub fn table_filters(&self) -> &FilterPipeline<TableSchema, TableContext> {
        &self.table_filters
    }

    pub fn migration_events(&self) -> &EventPipeline<MigrationEvent> {
        &self.migration_events
    }
}

impl Default for Registry {
    fn default() -> Self {
        Registry::builder().build_owned()
    }
}

fn rows_group(table: &str) -> String {
    format!("rows:{table}")
}

pub struct RegistryBuilder {
    table_filters: FilterPipeline<TableSchema, TableContext>,
    migration_events: EventPipeline<MigrationEvent>,
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self {
            table_filters: FilterPipeline::new("table_schema"),
            migration_events: EventPipeline::new("migration"),
        }
    }
}

impl RegistryBuilder {
    /// Adds a handler that may reshape every composed table schema.
    pub fn table_filter(mut self, handler: FilterHandler<TableSchema, TableContext>) -> Self {
        self.table_filters.push(handler);
        self
    }

    pub fn on_migration(mut self, handler: EventHandler<MigrationEvent>) -> Self {
        self.migration_events.push(handler);
        self
    }

    pub fn build(self) -> Arc<Registry> {
        Arc::new(self.build_owned())
    }

    fn build_owned(self) -> Registry {
        Registry {
            schemas: KeyedCache::new(),
            rows: KeyedCache::new(),
            table_filters: self.table_filters,
            migration_events: self.migration_events,
        }
    }
}
