use simplified_schema::Condition;

use crate::db::{Statement, quote_ident};
use crate::error::StoreError;
use crate::naming::TableNaming;
use crate::query::condition::{compile, qualified};
use crate::query::select::{Order, limit_clause};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinDirection {
    Left,
    Right,
}

impl JoinDirection {
    fn as_sql(self) -> &'static str {
        match self {
            JoinDirection::Left => "LEFT JOIN",
            JoinDirection::Right => "RIGHT JOIN",
        }
    }
}

/// One participant of a join.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinTable {
    pub table: String,
    /// `None` selects every column of the table.
    pub columns: Option<Vec<String>>,
    /// Column compared with the previous table's relation column.
    pub relation: String,
    pub condition: Condition,
}

impl JoinTable {
    pub fn new(table: impl Into<String>, relation: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: None,
            relation: relation.into(),
            condition: Condition::all(),
        }
    }

    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn filter(mut self, condition: Condition) -> Self {
        self.condition = condition;
        self
    }
}

/// A chained multi-table read. The first table is the anchor; each later table joins on
/// the previous table's relation column.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinQuery {
    pub direction: JoinDirection,
    pub tables: Vec<JoinTable>,
    /// `(table, column)` pairs.
    pub group_by: Vec<(String, String)>,
    /// Column of the anchor table.
    pub order_by: Option<String>,
    pub order: Order,
    pub page: u32,
    pub per_page: u32,
}

impl JoinQuery {
    pub fn new(direction: JoinDirection, tables: Vec<JoinTable>) -> Self {
        Self {
            direction,
            tables,
            group_by: Vec::new(),
            order_by: None,
            order: Order::Asc,
            page: 1,
            per_page: 0,
        }
    }

    pub fn left(tables: Vec<JoinTable>) -> Self {
        Self::new(JoinDirection::Left, tables)
    }

    pub fn right(tables: Vec<JoinTable>) -> Self {
        Self::new(JoinDirection::Right, tables)
    }

    pub fn group_by(mut self, table: impl Into<String>, column: impl Into<String>) -> Self {
        self.group_by.push((table.into(), column.into()));
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

    pub fn to_statement(&self, naming: &TableNaming) -> Result<Statement, StoreError> {
        let Some(anchor) = self.tables.first() else {
            return Err(StoreError::validation("join requires at least one table"));
        };
        let anchor_physical = naming.physical(&anchor.table);

        let mut selected = Vec::new();
        let mut from = Vec::with_capacity(self.tables.len());
        let mut previous: Option<String> = None;

        for joined in &self.tables {
            let physical = naming.physical(&joined.table);
            match &joined.columns {
                None => selected.push(format!("{}.*", quote_ident(&physical))),
                Some(columns) => selected.extend(
                    columns
                        .iter()
                        .map(|c| qualified(Some(&physical), c)),
                ),
            }

            let key = qualified(Some(&physical), &joined.relation);
            match previous.replace(key.clone()) {
                None => from.push(quote_ident(&physical)),
                Some(left) => from.push(format!(
                    "{} {} ON {left} = {key}",
                    self.direction.as_sql(),
                    quote_ident(&physical)
                )),
            }
        }

        let mut sql = format!("SELECT {} FROM {}", selected.join(", "), from.join(" "));

        let mut clauses = Vec::new();
        let mut params = Vec::new();
        for joined in &self.tables {
            let compiled = compile(&joined.condition, Some(&naming.physical(&joined.table)));
            if !compiled.is_empty() {
                clauses.push(compiled.clause);
                params.extend(compiled.params);
            }
        }
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }

        if !self.group_by.is_empty() {
            let groups: Vec<String> = self
                .group_by
                .iter()
                .map(|(table, column)| qualified(Some(&naming.physical(table)), column))
                .collect();
            sql.push_str(&format!(" GROUP BY {}", groups.join(", ")));
        }

        if let Some(column) = &self.order_by {
            sql.push_str(&format!(
                " ORDER BY {} {}",
                qualified(Some(&anchor_physical), column),
                self.order.as_sql()
            ));
        }

        if let Some(limit) = limit_clause(self.page, self.per_page) {
            sql.push_str(&limit);
        }

        Ok(Statement::with_params(sql, params))
    }
}
