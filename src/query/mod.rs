//! Row reads and writes against managed tables.
//!
//! Every write clears the memoized reads of its table. `update` reports the number of
//! affected rows and treats zero as success: a condition that matches nothing is not an
//! error.

pub mod coerce;
pub mod condition;
pub mod join;
pub mod select;
pub mod write;

pub use condition::{CompiledCondition, compile};
pub use join::{JoinDirection, JoinQuery, JoinTable};
pub use select::{Columns, Order, QueryResult, SelectQuery};
pub use write::InsertOutcome;

use serde_json::{Map, Value};
use simplified_schema::Condition;
use tracing::debug;

use crate::db::{Database, Row, Statement};
use crate::error::StoreError;
use crate::store::SchemaStore;

#[derive(Clone)]
pub struct Executor<D> {
    store: SchemaStore<D>,
}

impl<D: Database> Executor<D> {
    pub fn new(store: SchemaStore<D>) -> Self {
        Self { store }
    }

    pub async fn get(&self, query: &SelectQuery) -> Result<QueryResult, StoreError> {
        let stmt = query.to_statement(self.store.naming());
        let mut rows = self.store.db().fetch(stmt).await?;

        if query.columns == Columns::Count {
            let count = rows
                .first()
                .and_then(|row| row.get("count"))
                .and_then(count_value)
                .unwrap_or(0);
            return Ok(QueryResult::Count(count));
        }

        if !rows.is_empty() {
            let schema = self.store.get(&query.table).await?;
            coerce::decode_rows(&schema, &mut rows);
        }
        Ok(QueryResult::Rows(rows))
    }

    /// First matching row, or [`StoreError::RowNotFound`].
    pub async fn get_row(&self, query: &SelectQuery) -> Result<Row, StoreError> {
        let single = query.clone().page(1, 1);
        self.get(&single)
            .await?
            .into_rows()
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::RowNotFound(query.table.clone()))
    }

    /// One column of the first matching row, `fallback` when there is no row or no such
    /// column.
    pub async fn get_value(
        &self,
        query: &SelectQuery,
        column: &str,
        fallback: Value,
    ) -> Result<Value, StoreError> {
        match self.get_row(query).await {
            Ok(mut row) => Ok(row.remove(column).unwrap_or(fallback)),
            Err(StoreError::RowNotFound(_)) => Ok(fallback),
            Err(err) => Err(err),
        }
    }

    /// [`Executor::get`] memoized per table until the next write to it.
    pub async fn select_cached(&self, query: &SelectQuery) -> Result<QueryResult, StoreError> {
        let registry = self.store.registry();
        let Some(key) = query.cache_key() else {
            return self.get(query).await;
        };

        if let Some(hit) = registry.cached_rows(&query.table, &key) {
            debug!(table = %query.table, "memoized read");
            return Ok(hit);
        }

        let generation = registry.rows_generation(&query.table);
        let result = self.get(query).await?;
        if !registry.cache_rows(&query.table, key, result.clone(), generation) {
            debug!(table = %query.table, "table written during read, result not memoized");
        }
        Ok(result)
    }

    /// Runs a hand-written read. Rows are not coerced.
    pub async fn raw_query(&self, statement: Statement) -> Result<Vec<Row>, StoreError> {
        self.store.db().fetch(statement).await
    }

    pub async fn insert(
        &self,
        table: &str,
        row: Map<String, Value>,
    ) -> Result<InsertOutcome, StoreError> {
        let schema = self.store.get(table).await?;
        let prepared = write::prepare_insert(&schema, row)?;

        let stmt = write::insert_statement(self.store.naming(), table, prepared);
        let done = self.store.db().execute(stmt).await?;
        self.store.registry().forget_rows(table);

        if schema.auto_increment_column().is_some() && done.last_insert_id > 0 {
            Ok(InsertOutcome::Id(done.last_insert_id))
        } else {
            Ok(InsertOutcome::Inserted)
        }
    }

    /// Returns the number of affected rows; zero is not an error.
    pub async fn update(
        &self,
        table: &str,
        partial: Map<String, Value>,
        condition: &Condition,
    ) -> Result<u64, StoreError> {
        let schema = self.store.get(table).await?;
        let values = write::prepare_update(&schema, partial)?;

        let stmt = write::update_statement(self.store.naming(), table, values, condition)?;
        let done = self.store.db().execute(stmt).await?;
        self.store.registry().forget_rows(table);

        debug!(table, rows = done.rows_affected, "rows updated");
        Ok(done.rows_affected)
    }

    pub async fn delete(
        &self,
        table: &str,
        condition: &Condition,
        offset: Option<u64>,
        limit: Option<u64>,
    ) -> Result<u64, StoreError> {
        let stmt = write::delete_statement(self.store.naming(), table, condition, offset, limit);
        let done = self.store.db().execute(stmt).await?;
        self.store.registry().forget_rows(table);

        debug!(table, rows = done.rows_affected, "rows deleted");
        Ok(done.rows_affected)
    }

    /// Joined rows, returned as the backend produced them.
    pub async fn join(&self, query: &JoinQuery) -> Result<Vec<Row>, StoreError> {
        let stmt = query.to_statement(self.store.naming())?;
        self.store.db().fetch(stmt).await
    }
}

fn count_value(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}
