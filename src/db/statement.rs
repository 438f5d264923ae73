use serde::Serialize;
use serde_json::{Map, Value};

/// One decoded result row, column name to JSON value, in select order.
pub type Row = Map<String, Value>;

/// A parameterized SQL statement handed to the backend as one unit.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

/// What a write statement reports back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecResult {
    pub rows_affected: u64,
    /// Zero when the table has no auto-increment column.
    pub last_insert_id: u64,
}

impl Statement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    pub fn with_params(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.params.push(value.into());
        self
    }

    /// Rewrites every `?` whose parameter is an array into one placeholder per element and
    /// flattens the parameter list accordingly. An empty array becomes `NULL`, so `IN (?)`
    /// over nothing matches no row.
    ///
    /// Placeholders inside quoted literals and quoted identifiers are left alone.
    pub fn expand(self) -> Statement {
        if !self.params.iter().any(Value::is_array) {
            return self;
        }

        let mut sql = String::with_capacity(self.sql.len() + 16);
        let mut params = Vec::with_capacity(self.params.len());
        let mut pending = self.params.into_iter();
        let mut quote: Option<char> = None;

        let mut chars = self.sql.chars().peekable();
        while let Some(ch) = chars.next() {
            match quote {
                Some(q) => {
                    sql.push(ch);
                    if ch == '\\' && q != '`' {
                        if let Some(escaped) = chars.next() {
                            sql.push(escaped);
                        }
                    } else if ch == q {
                        if chars.peek() == Some(&q) {
                            sql.push(q);
                            chars.next();
                        } else {
                            quote = None;
                        }
                    }
                }
                None => match ch {
                    '\'' | '"' | '`' => {
                        quote = Some(ch);
                        sql.push(ch);
                    }
                    '?' => match pending.next() {
                        Some(Value::Array(items)) if items.is_empty() => sql.push_str("NULL"),
                        Some(Value::Array(items)) => {
                            let marks = vec!["?"; items.len()].join(", ");
                            sql.push_str(&marks);
                            params.extend(items);
                        }
                        Some(other) => {
                            sql.push('?');
                            params.push(other);
                        }
                        None => sql.push('?'),
                    },
                    _ => sql.push(ch),
                },
            }
        }
        params.extend(pending);

        Statement { sql, params }
    }
}

/// Quotes an identifier with backticks, doubling embedded backticks.
pub fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Quotes a string literal for DDL, where placeholders are not accepted.
pub fn quote_literal(text: &str) -> String {
    format!("'{}'", text.replace('\\', "\\\\").replace('\'', "''"))
}
