use serde::Serialize;
use simplified_cache::{CacheKey, CacheKeyGenerator};
use simplified_schema::Condition;

use crate::db::{Row, Statement, quote_ident};
use crate::naming::TableNaming;
use crate::query::condition::compile;

/// What a select returns.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Columns {
    #[default]
    All,
    List(Vec<String>),
    Count,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

impl Order {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Order::Asc => "ASC",
            Order::Desc => "DESC",
        }
    }
}

/// A single-table read.
///
/// Serializes to a canonical form; two equal queries always derive the same cache key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectQuery {
    pub table: String,
    pub columns: Columns,
    pub condition: Condition,
    pub group_by: Vec<String>,
    pub order_by: Option<String>,
    pub order: Order,
    /// 1-based.
    pub page: u32,
    /// 0 means no LIMIT.
    pub per_page: u32,
}

impl SelectQuery {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Columns::All,
            condition: Condition::all(),
            group_by: Vec::new(),
            order_by: None,
            order: Order::Asc,
            page: 1,
            per_page: 0,
        }
    }

    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = Columns::List(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn count(mut self) -> Self {
        self.columns = Columns::Count;
        self
    }

    pub fn filter(mut self, condition: Condition) -> Self {
        self.condition = condition;
        self
    }

    pub fn group_by(mut self, column: impl Into<String>) -> Self {
        self.group_by.push(column.into());
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, order: Order) -> Self {
        self.order_by = Some(column.into());
        self.order = order;
        self
    }

    pub fn page(mut self, page: u32, per_page: u32) -> Self {
        self.page = page;
        self.per_page = per_page;
        self
    }

    /// Memoization key: canonical JSON of the whole query.
    pub fn cache_key(&self) -> Option<CacheKey> {
        CacheKeyGenerator::generate_json(self)
    }

    pub fn to_statement(&self, naming: &TableNaming) -> Statement {
        let physical = naming.physical(&self.table);

        let selected = match &self.columns {
            Columns::All => "*".to_string(),
            Columns::Count => "COUNT(*) AS `count`".to_string(),
            Columns::List(columns) => columns
                .iter()
                .map(|c| quote_ident(c))
                .collect::<Vec<_>>()
                .join(", "),
        };

        let mut sql = format!("SELECT {selected} FROM {}", quote_ident(&physical));
        let mut params = Vec::new();

        let compiled = compile(&self.condition, Some(&physical));
        if !compiled.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&compiled.clause);
            params = compiled.params;
        }

        if !self.group_by.is_empty() {
            let groups: Vec<String> = self.group_by.iter().map(|c| quote_ident(c)).collect();
            sql.push_str(&format!(" GROUP BY {}", groups.join(", ")));
        }

        if let Some(column) = &self.order_by {
            sql.push_str(&format!(
                " ORDER BY {} {}",
                quote_ident(column),
                self.order.as_sql()
            ));
        }

        if let Some(limit) = limit_clause(self.page, self.per_page) {
            sql.push_str(&limit);
        }

        Statement::with_params(sql, params)
    }
}

/// ` LIMIT offset, per_page` with offset `(page - 1) * per_page`; page 0 counts as 1.
pub(crate) fn limit_clause(page: u32, per_page: u32) -> Option<String> {
    if per_page == 0 {
        return None;
    }
    let offset = u64::from(page.max(1) - 1) * u64::from(per_page);
    Some(format!(" LIMIT {offset}, {per_page}"))
}

/// Result of [`SelectQuery`]: decoded rows, or the scalar of a count query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryResult {
    Rows(Vec<Row>),
    Count(u64),
}

impl QueryResult {
    pub fn rows(&self) -> &[Row] {
        match self {
            QueryResult::Rows(rows) => rows,
            QueryResult::Count(_) => &[],
        }
    }

    pub fn into_rows(self) -> Vec<Row> {
        match self {
            QueryResult::Rows(rows) => rows,
            QueryResult::Count(_) => Vec::new(),
        }
    }

    pub fn count(&self) -> Option<u64> {
        match self {
            QueryResult::Count(n) => Some(*n),
            QueryResult::Rows(_) => None,
        }
    }
}
