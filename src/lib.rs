pub mod compose;
pub mod config;
pub mod content_store;
pub mod db;
pub mod error;
pub mod hooks;
pub mod install;
pub mod migrate;
pub mod naming;
pub mod query;
pub mod registry;
pub mod store;
pub mod utils;

pub use content_store::ContentStore;
pub use error::StoreError;
pub use naming::TableNaming;
pub use registry::Registry;
pub use simplified_schema::{ColumnDefinition, ColumnKind, Condition, Predicate, TableSchema};
