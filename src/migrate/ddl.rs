//! DDL text for managed tables. Pure string building; nothing here talks to the backend.

use serde_json::Value;
use simplified_schema::{ColumnDefinition, ColumnKind, SchemaDiff, TableSchema};

use crate::db::{quote_ident, quote_literal};
use crate::naming::TableNaming;

const VARCHAR_LIMIT: u32 = 255;
const CURRENT_TIMESTAMP: &str = "CURRENT_TIMESTAMP";

/// Full column definition: quoted name, storage type, then modifiers.
pub fn column_clause(name: &str, def: &ColumnDefinition) -> String {
    let mut parts = vec![quote_ident(name), storage_type(def)];

    if def.required {
        parts.push("NOT NULL".to_string());
    }
    if def.unique {
        parts.push("UNIQUE".to_string());
    }
    if def.primary {
        parts.push("PRIMARY KEY".to_string());
    }
    if def.auto_increment {
        parts.push("AUTO_INCREMENT".to_string());
    }
    if let Some(default) = default_clause(def) {
        parts.push(default);
    }

    parts.join(" ")
}

fn storage_type(def: &ColumnDefinition) -> String {
    match def.kind {
        ColumnKind::Int if def.auto_increment => format!("BIGINT({})", def.length.unwrap_or(20)),
        ColumnKind::Bigint => format!("BIGINT({})", def.length.unwrap_or(20)),
        ColumnKind::Int => format!("INT({})", def.length.unwrap_or(1)),
        ColumnKind::String => match def.length.unwrap_or(VARCHAR_LIMIT) {
            len if len > VARCHAR_LIMIT => "LONGTEXT".to_string(),
            len => format!("VARCHAR({len})"),
        },
        ColumnKind::Object | ColumnKind::Array => "LONGTEXT".to_string(),
        ColumnKind::Enum => {
            let values: Vec<String> = def.enum_values.iter().map(|v| quote_literal(v)).collect();
            format!("ENUM({})", values.join(", "))
        }
        ColumnKind::Bool => "SMALLINT(1)".to_string(),
        ColumnKind::Timestamp => "TIMESTAMP".to_string(),
    }
}

fn default_clause(def: &ColumnDefinition) -> Option<String> {
    if def.kind == ColumnKind::Bool {
        let flag = match &def.default {
            Some(Value::Bool(true)) => "1".to_string(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::String(s)) if s == "1" || s.eq_ignore_ascii_case("true") => {
                "1".to_string()
            }
            _ => "0".to_string(),
        };
        return Some(format!("DEFAULT {flag}"));
    }

    let literal = match def.default.as_ref()? {
        Value::Null => return None,
        Value::String(s) if s.eq_ignore_ascii_case(CURRENT_TIMESTAMP) => {
            return Some(format!("DEFAULT {CURRENT_TIMESTAMP}"));
        }
        Value::String(s) => quote_literal(s),
        Value::Bool(b) => quote_literal(if *b { "1" } else { "0" }),
        other => quote_literal(&other.to_string()),
    };
    Some(format!("DEFAULT {literal}"))
}

/// `CREATE TABLE IF NOT EXISTS` with one combined secondary index over the indexed columns.
pub fn create_table(naming: &TableNaming, table: &str, schema: &TableSchema) -> String {
    let mut clauses: Vec<String> = schema
        .iter()
        .map(|(name, def)| column_clause(name, def))
        .collect();

    let indexed: Vec<String> = schema.indexed_columns().map(quote_ident).collect();
    if !indexed.is_empty() {
        clauses.push(format!("INDEX ({})", indexed.join(", ")));
    }

    format!(
        "CREATE TABLE IF NOT EXISTS {} ({}) {}",
        naming.quoted(table),
        clauses.join(", "),
        naming.table_options()
    )
}

/// One `ALTER TABLE` covering the whole diff, or `None` when there is nothing to alter.
/// Changed columns only apply when they exist in `stored`.
pub fn alter_table(
    naming: &TableNaming,
    table: &str,
    stored: &TableSchema,
    diff: &SchemaDiff,
) -> Option<String> {
    let mut clauses = Vec::new();

    for (name, def) in diff.added.iter() {
        clauses.push(format!("ADD COLUMN {}", column_clause(name, def)));
    }
    for (name, def) in diff.changed.iter() {
        if stored.contains(name) {
            clauses.push(format!(
                "CHANGE COLUMN {} {}",
                quote_ident(name),
                column_clause(name, def)
            ));
        }
    }
    for name in &diff.dropped {
        if stored.contains(name) {
            clauses.push(format!("DROP COLUMN {}", quote_ident(name)));
        }
    }

    if clauses.is_empty() {
        return None;
    }
    Some(format!(
        "ALTER TABLE {} {}",
        naming.quoted(table),
        clauses.join(", ")
    ))
}

/// `DROP INDEX` statements for dropped columns that carried an index in `stored`.
pub fn drop_indexes(
    naming: &TableNaming,
    table: &str,
    stored: &TableSchema,
    dropped: &[String],
) -> Vec<String> {
    dropped
        .iter()
        .filter(|name| stored.get(name).is_some_and(|def| def.index))
        .map(|name| format!("DROP INDEX {} ON {}", quote_ident(name), naming.quoted(table)))
        .collect()
}

pub fn rename_table(naming: &TableNaming, from: &str, to: &str) -> String {
    format!(
        "ALTER TABLE {} RENAME TO {}",
        naming.quoted(from),
        naming.quoted(to)
    )
}

pub fn drop_table(naming: &TableNaming, table: &str) -> String {
    format!("DROP TABLE {}", naming.quoted(table))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_storage() {
        assert_eq!(column_clause("n", &ColumnDefinition::new(ColumnKind::Int)), "`n` INT(1)");
        assert_eq!(column_clause("n", &ColumnDefinition::int(20)), "`n` INT(20)");
        assert_eq!(column_clause("n", &ColumnDefinition::bigint()), "`n` BIGINT(20)");
        assert_eq!(
            column_clause("ID", &ColumnDefinition::int(11).primary().auto_increment()),
            "`ID` BIGINT(11) PRIMARY KEY AUTO_INCREMENT"
        );
    }

    #[test]
    fn string_storage_switches_to_longtext_past_255() {
        assert_eq!(column_clause("s", &ColumnDefinition::string(200)), "`s` VARCHAR(200)");
        assert_eq!(column_clause("s", &ColumnDefinition::string(255)), "`s` VARCHAR(255)");
        assert_eq!(column_clause("s", &ColumnDefinition::string(1000)), "`s` LONGTEXT");
        assert_eq!(
            column_clause("s", &ColumnDefinition::new(ColumnKind::String)),
            "`s` VARCHAR(255)"
        );
        assert_eq!(column_clause("o", &ColumnDefinition::object()), "`o` LONGTEXT");
        assert_eq!(column_clause("a", &ColumnDefinition::array()), "`a` LONGTEXT");
    }

    #[test]
    fn enum_bool_and_timestamp() {
        assert_eq!(
            column_clause(
                "status",
                &ColumnDefinition::enumeration(["open", "close"]).default_value("open")
            ),
            "`status` ENUM('open', 'close') DEFAULT 'open'"
        );
        assert_eq!(column_clause("b", &ColumnDefinition::boolean()), "`b` SMALLINT(1) DEFAULT 0");
        assert_eq!(
            column_clause("b", &ColumnDefinition::boolean().default_value(true)),
            "`b` SMALLINT(1) DEFAULT 1"
        );
        assert_eq!(
            column_clause("created", &ColumnDefinition::current_timestamp()),
            "`created` TIMESTAMP DEFAULT CURRENT_TIMESTAMP"
        );
    }

    #[test]
    fn modifiers_come_in_fixed_order() {
        let def = ColumnDefinition::string(100)
            .default_value("x")
            .unique()
            .required();
        assert_eq!(
            column_clause("slug", &def),
            "`slug` VARCHAR(100) NOT NULL UNIQUE DEFAULT 'x'"
        );
    }

    #[test]
    fn defaults_are_escaped() {
        let def = ColumnDefinition::string(20).default_value("it's");
        assert_eq!(column_clause("s", &def), "`s` VARCHAR(20) DEFAULT 'it''s'");
        let def = ColumnDefinition::int(2).default_value(50);
        assert_eq!(column_clause("n", &def), "`n` INT(2) DEFAULT '50'");
    }

    #[test]
    fn create_table_adds_one_combined_index() {
        let naming = TableNaming::new("p_");
        let schema = TableSchema::new()
            .with_column("ID", ColumnDefinition::bigint().primary().auto_increment().index())
            .with_column("email", ColumnDefinition::string(100).required().index())
            .with_column("name", ColumnDefinition::string(60));

        assert_eq!(
            create_table(&naming, "users", &schema),
            "CREATE TABLE IF NOT EXISTS `p_users` (\
             `ID` BIGINT(20) PRIMARY KEY AUTO_INCREMENT, \
             `email` VARCHAR(100) NOT NULL, \
             `name` VARCHAR(60), \
             INDEX (`ID`, `email`)) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4"
        );
    }

    #[test]
    fn alter_table_orders_add_change_drop() {
        let naming = TableNaming::default();
        let stored = TableSchema::new()
            .with_column("a", ColumnDefinition::string(10))
            .with_column("b", ColumnDefinition::int(5));
        let desired = TableSchema::new()
            .with_column("a", ColumnDefinition::string(20))
            .with_column("c", ColumnDefinition::boolean());

        let sql = alter_table(&naming, "t", &stored, &stored.diff(&desired)).unwrap();
        assert_eq!(
            sql,
            "ALTER TABLE `t` ADD COLUMN `c` SMALLINT(1) DEFAULT 0, \
             CHANGE COLUMN `a` `a` VARCHAR(20), DROP COLUMN `b`"
        );
    }

    #[test]
    fn alter_table_without_changes_is_none() {
        let naming = TableNaming::default();
        let stored = TableSchema::new().with_column("a", ColumnDefinition::string(10));
        assert!(alter_table(&naming, "t", &stored, &stored.diff(&stored)).is_none());
    }

    #[test]
    fn only_indexed_dropped_columns_lose_an_index() {
        let naming = TableNaming::default();
        let stored = TableSchema::new()
            .with_column("a", ColumnDefinition::string(10).index())
            .with_column("b", ColumnDefinition::string(10));
        let dropped = vec!["a".to_string(), "b".to_string()];
        assert_eq!(
            drop_indexes(&naming, "t", &stored, &dropped),
            vec!["DROP INDEX `a` ON `t`".to_string()]
        );
    }
}
