//! Derives the tables backing one content type and keeps them in step with it.
//!
//! A type with slug `news` owns `news_content`, `news_meta` and, when comments are enabled,
//! `news_comments`. Every derived schema passes through the registry's `table_schema`
//! filters before it reaches the migrator.

mod defaults;

use serde::{Deserialize, Serialize};
use simplified_schema::TableSchema;
use tracing::info;

use crate::db::Database;
use crate::error::StoreError;
use crate::migrate::Migrator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    #[default]
    Content,
    Group,
}

/// A content type, as far as its storage is concerned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    pub slug: String,
    #[serde(rename = "type", default)]
    pub kind: TypeKind,
    #[serde(default)]
    pub hierarchical: bool,
    #[serde(default)]
    pub comments: bool,
    /// Replaces the kind's default field set when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<TableSchema>,
}

impl TypeDescriptor {
    pub fn new(slug: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            slug: slug.into(),
            kind,
            hierarchical: false,
            comments: false,
            fields: None,
        }
    }

    pub fn hierarchical(mut self) -> Self {
        self.hierarchical = true;
        self
    }

    pub fn with_comments(mut self) -> Self {
        self.comments = true;
        self
    }

    pub fn fields(mut self, fields: TableSchema) -> Self {
        self.fields = Some(fields);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TableRole {
    Content,
    Meta,
    Comments,
}

impl TableRole {
    pub fn suffix(&self) -> &'static str {
        match self {
            TableRole::Content => "content",
            TableRole::Meta => "meta",
            TableRole::Comments => "comments",
        }
    }

    pub fn table_name(&self, slug: &str) -> String {
        format!("{slug}_{}", self.suffix())
    }
}

/// Handed to `table_schema` filters alongside the schema being composed.
#[derive(Debug, Clone, PartialEq)]
pub struct TableContext {
    pub table: String,
    pub role: TableRole,
    pub descriptor: TypeDescriptor,
}

/// One derived table: logical name, role and filtered schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedTable {
    pub table: String,
    pub role: TableRole,
    pub schema: TableSchema,
}

#[derive(Clone)]
pub struct Composer<D> {
    migrator: Migrator<D>,
}

impl<D: Database> Composer<D> {
    pub fn new(migrator: Migrator<D>) -> Self {
        Self { migrator }
    }

    /// The tables `descriptor` needs, in creation order.
    pub fn compose(&self, descriptor: &TypeDescriptor) -> Result<Vec<ComposedTable>, StoreError> {
        if descriptor.slug.trim().is_empty() {
            return Err(StoreError::validation("slug is required"));
        }

        let mut derived = vec![
            (TableRole::Content, defaults::content_table(descriptor)),
            (TableRole::Meta, defaults::meta_table()),
        ];
        if descriptor.comments {
            derived.push((TableRole::Comments, defaults::comments_table()));
        }

        let filters = self.migrator.store().registry().table_filters();
        derived
            .into_iter()
            .map(|(role, schema)| {
                let context = TableContext {
                    table: role.table_name(&descriptor.slug),
                    role,
                    descriptor: descriptor.clone(),
                };
                let schema = filters.apply(schema, &context)?;
                Ok(ComposedTable {
                    table: context.table,
                    role,
                    schema,
                })
            })
            .collect()
    }

    pub async fn install(&self, descriptor: &TypeDescriptor) -> Result<(), StoreError> {
        for composed in self.compose(descriptor)? {
            self.migrator
                .create_table(&composed.table, &composed.schema)
                .await?;
        }
        info!(slug = %descriptor.slug, "content type installed");
        Ok(())
    }

    /// Moves the tables of `old` to the shape of `new`.
    ///
    /// Old tables are renamed when the slug changed and dropped when `new` no longer needs
    /// them; every table `new` needs is then reconciled.
    pub async fn update(&self, new: &TypeDescriptor, old: &TypeDescriptor) -> Result<(), StoreError> {
        let wanted = self.compose(new)?;
        let existing = self.compose(old)?;

        for previous in &existing {
            let still_needed = wanted.iter().any(|t| t.role == previous.role);
            let target = previous.role.table_name(&new.slug);

            if !still_needed {
                self.migrator.drop_table(&previous.table).await?;
            } else if target != previous.table {
                self.migrator.rename_table(&previous.table, &target).await?;
            }
        }

        for table in &wanted {
            self.migrator.reconcile(&table.table, &table.schema).await?;
        }

        info!(slug = %new.slug, from = %old.slug, "content type updated");
        Ok(())
    }

    pub async fn uninstall(&self, descriptor: &TypeDescriptor) -> Result<(), StoreError> {
        for composed in self.compose(descriptor)? {
            self.migrator.drop_table(&composed.table).await?;
        }
        info!(slug = %descriptor.slug, "content type removed");
        Ok(())
    }
}
