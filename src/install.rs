//! First-run installation of the tables every deployment needs.

use simplified_schema::{ColumnDefinition, TableSchema};
use tracing::info;

use crate::db::Database;
use crate::error::StoreError;
use crate::migrate::{Migrator, ReconcileOutcome};

pub const PROPERTIES_TABLE: &str = "properties";
pub const ROUTES_TABLE: &str = "routes";
pub const USERS_TABLE: &str = "users";
pub const CONTENT_TYPES_TABLE: &str = "content_types";

/// The core tables, in installation order.
pub fn core_tables() -> Vec<(&'static str, TableSchema)> {
    vec![
        (
            PROPERTIES_TABLE,
            TableSchema::new()
                .with_column("name", ColumnDefinition::string(200).required().primary())
                .with_column("value", ColumnDefinition::object()),
        ),
        (
            ROUTES_TABLE,
            TableSchema::new()
                .with_column("route", ColumnDefinition::string(255).primary())
                .with_column("args", ColumnDefinition::object()),
        ),
        (
            USERS_TABLE,
            TableSchema::new()
                .with_column(
                    "ID",
                    ColumnDefinition::int(20)
                        .auto_increment()
                        .primary()
                        .required()
                        .index(),
                )
                .with_column("display", ColumnDefinition::string(60).required())
                .with_column("email", ColumnDefinition::string(100).required().index())
                .with_column("pass", ColumnDefinition::string(255).required())
                .with_column("group", ColumnDefinition::string(60).required())
                .with_column("registered", ColumnDefinition::current_timestamp()),
        ),
        (
            CONTENT_TYPES_TABLE,
            TableSchema::new()
                .with_column("name", ColumnDefinition::string(60).required().index())
                .with_column("slug", ColumnDefinition::string(100).required().unique())
                .with_column(
                    "type",
                    ColumnDefinition::enumeration(["content", "group"]).default_value("content"),
                )
                .with_column(
                    "status",
                    ColumnDefinition::enumeration(["active", "inactive", "builtin"])
                        .default_value("active"),
                )
                .with_column("hierarchical", ColumnDefinition::boolean())
                .with_column("archive", ColumnDefinition::boolean())
                .with_column("page", ColumnDefinition::boolean())
                .with_column("comments", ColumnDefinition::boolean())
                .with_column("rest", ColumnDefinition::boolean())
                .with_column("archiveTitle", ColumnDefinition::string(160))
                .with_column("archiveDescription", ColumnDefinition::string(255))
                .with_column("archiveSlug", ColumnDefinition::string(60).required())
                .with_column("itemsPerPage", ColumnDefinition::int(2).default_value(50))
                .with_column("fields", ColumnDefinition::object())
                .with_column("parents", ColumnDefinition::array()),
        ),
    ]
}

/// Checks the connection, creates the metadata table, then brings every core table to its
/// current shape. Safe to run on every start.
pub async fn install_core_tables<D: Database>(migrator: &Migrator<D>) -> Result<(), StoreError> {
    let store = migrator.store();
    store.db().ping().await?;
    store.create_metadata_table().await?;

    for (table, schema) in core_tables() {
        let outcome = migrator.reconcile(table, &schema).await?;
        if outcome != ReconcileOutcome::Unchanged {
            info!(table, ?outcome, "core table installed");
        }
    }
    Ok(())
}
