use simplified_schema::{ColumnDefinition, TableSchema};

use super::{TypeDescriptor, TypeKind};

pub(super) fn content_table(descriptor: &TypeDescriptor) -> TableSchema {
    let mut schema = TableSchema::new().with_column(
        "ID",
        ColumnDefinition::bigint()
            .length(20)
            .auto_increment()
            .primary()
            .index(),
    );

    let fields = descriptor
        .fields
        .clone()
        .unwrap_or_else(|| default_fields(descriptor.kind));
    for (name, def) in fields.iter() {
        schema.insert(name, def.clone());
    }

    if descriptor.kind == TypeKind::Content {
        for stamp in ["created", "updated"] {
            if !schema.contains(stamp) {
                schema.insert(stamp, ColumnDefinition::current_timestamp());
            }
        }
    }

    if descriptor.hierarchical {
        schema.insert("parent", ColumnDefinition::int(20));
    }

    if descriptor.comments {
        schema.insert(
            "comments",
            ColumnDefinition::enumeration(["open", "close", "disabled"]).default_value("open"),
        );
    }

    schema
}

fn default_fields(kind: TypeKind) -> TableSchema {
    let leading = match kind {
        TypeKind::Content => TableSchema::new()
            .with_column("title", ColumnDefinition::string(200).required())
            .with_column(
                "status",
                ColumnDefinition::enumeration(["public", "private", "pending", "draft"])
                    .default_value("draft")
                    .required(),
            )
            .with_column("summary", ColumnDefinition::string(255))
            .with_column("description", ColumnDefinition::string(1000))
            .with_column("author", ColumnDefinition::int(20).index()),
        TypeKind::Group => TableSchema::new()
            .with_column("name", ColumnDefinition::string(200).required().index())
            .with_column("description", ColumnDefinition::string(255)),
    };

    leading
        .with_column("slug", ColumnDefinition::string(200).required().index())
        .with_column("thumb", ColumnDefinition::int(20))
}

pub(super) fn meta_table() -> TableSchema {
    TableSchema::new()
        .with_column("name", ColumnDefinition::string(160).required().index())
        .with_column("value", ColumnDefinition::object())
        .with_column("contentId", ColumnDefinition::bigint().required().index())
}

pub(super) fn comments_table() -> TableSchema {
    TableSchema::new()
        .with_column(
            "ID",
            ColumnDefinition::bigint()
                .required()
                .primary()
                .auto_increment()
                .index(),
        )
        .with_column("parent", ColumnDefinition::bigint().default_value(0))
        .with_column("contentId", ColumnDefinition::bigint().required().index())
        .with_column("comment", ColumnDefinition::string(1000).required())
        .with_column(
            "status",
            ColumnDefinition::enumeration(["public", "private", "pending", "spam"])
                .default_value("pending"),
        )
        .with_column("authorId", ColumnDefinition::bigint())
        .with_column("author", ColumnDefinition::string(255))
        .with_column("authorEmail", ColumnDefinition::string(160))
        .with_column("authorUrl", ColumnDefinition::string(160))
        .with_column("date", ColumnDefinition::current_timestamp())
}
