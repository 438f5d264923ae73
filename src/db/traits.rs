use async_trait::async_trait;

use super::statement::{ExecResult, Row, Statement};
use crate::error::StoreError;

/// The one seam between the storage core and the relational backend.
///
/// Every call acquires and releases its own connection; there is no transaction spanning
/// two calls.
#[async_trait]
pub trait Database: Send + Sync {
    async fn execute(&self, statement: Statement) -> Result<ExecResult, StoreError>;

    async fn fetch(&self, statement: Statement) -> Result<Vec<Row>, StoreError>;

    /// Round-trips a trivial statement to prove the backend is reachable.
    async fn ping(&self) -> Result<(), StoreError> {
        self.fetch(Statement::new("SELECT 1")).await.map(|_| ())
    }
}
