use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Storage kind of a managed column.
///
/// Serialized with the exact identifiers persisted in schema records. `str` and `date`
/// are accepted on input for records written by older installs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Int,
    Bigint,
    #[default]
    #[serde(alias = "str")]
    String,
    Enum,
    Bool,
    #[serde(alias = "date")]
    Timestamp,
    Object,
    Array,
}

impl ColumnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnKind::Int => "int",
            ColumnKind::Bigint => "bigint",
            ColumnKind::String => "string",
            ColumnKind::Enum => "enum",
            ColumnKind::Bool => "bool",
            ColumnKind::Timestamp => "timestamp",
            ColumnKind::Object => "object",
            ColumnKind::Array => "array",
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, ColumnKind::Int | ColumnKind::Bigint)
    }

    /// Object and array columns hold JSON text.
    pub fn is_json(&self) -> bool {
        matches!(self, ColumnKind::Object | ColumnKind::Array)
    }
}

/// Declarative description of one column.
///
/// The column name is the key under which the definition sits in a [`crate::TableSchema`].
/// Flags that are `false` and unset options are omitted when serialized, so two
/// definitions compare equal exactly when their persisted JSON does.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDefinition {
    #[serde(rename = "type")]
    pub kind: ColumnKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub unique: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub primary: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub auto_increment: bool,

    /// `None` => no DEFAULT clause. `"CURRENT_TIMESTAMP"` is emitted unquoted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub index: bool,

    #[serde(rename = "enum", default, skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<String>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl ColumnDefinition {
    pub fn new(kind: ColumnKind) -> Self {
        Self {
            kind,
            ..Default::default()
        }
    }

    pub fn int(length: u32) -> Self {
        Self::new(ColumnKind::Int).length(length)
    }

    pub fn bigint() -> Self {
        Self::new(ColumnKind::Bigint)
    }

    pub fn string(length: u32) -> Self {
        Self::new(ColumnKind::String).length(length)
    }

    pub fn enumeration<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind: ColumnKind::Enum,
            enum_values: values.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn boolean() -> Self {
        Self::new(ColumnKind::Bool)
    }

    pub fn timestamp() -> Self {
        Self::new(ColumnKind::Timestamp)
    }

    /// Timestamp column defaulting to `CURRENT_TIMESTAMP`; stamped on insert when absent.
    pub fn current_timestamp() -> Self {
        Self::timestamp().default_value("CURRENT_TIMESTAMP")
    }

    pub fn object() -> Self {
        Self::new(ColumnKind::Object)
    }

    pub fn array() -> Self {
        Self::new(ColumnKind::Array)
    }

    pub fn length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn primary(mut self) -> Self {
        self.primary = true;
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    pub fn index(mut self) -> Self {
        self.index = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Required on insert: no default to fall back to and not generated by the database.
    pub fn must_be_supplied(&self) -> bool {
        self.required && self.default.is_none() && !self.auto_increment
    }

    /// Stamped with the current time on insert when the row omits it.
    pub fn is_auto_stamped(&self) -> bool {
        self.kind == ColumnKind::Timestamp && self.default.is_some()
    }
}
