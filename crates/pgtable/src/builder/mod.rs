//! Single-table statement builder.
//!
//! [`QueryBuilder`] knows one table and its primary key and produces the four
//! statements the CRUD shell needs. Every identifier goes through [`Ident`];
//! every value is a bound placeholder.
//!
//! ```ignore
//! use pgtable::{Assignments, Filter, Projection, QueryBuilder};
//!
//! let qb = QueryBuilder::new("reviews", "email_address")?;
//!
//! let q = qb.build_select(Projection::All, Some(Filter::new("country", "DK")?));
//! // SELECT * FROM "reviews" WHERE "country" = $1
//!
//! let mut values = Assignments::new();
//! values.set("reviewer_name", "John Doe")?.set("email_address", "john@example.com")?;
//! let q = qb.build_insert(&values)?;
//! // INSERT INTO "reviews" ("reviewer_name", "email_address") VALUES ($1, $2) RETURNING *
//! ```

use crate::error::{TableError, TableResult};
use crate::ident::{Ident, IntoIdent};
use crate::query::{Query, StatementKind};
use crate::record::Assignments;
use crate::value::TextValue;

/// Columns to project in a SELECT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    /// `*`
    All,
    /// An explicit, quoted column list.
    Columns(Vec<Ident>),
}

impl Projection {
    /// Parse a comma-separated column list; blank input or a lone `*` selects all.
    pub fn parse(list: &str) -> TableResult<Self> {
        let list = list.trim();
        if list.is_empty() || list == "*" {
            return Ok(Self::All);
        }
        let columns = list
            .split(',')
            .map(|c| Ident::new(c.trim()))
            .collect::<TableResult<Vec<_>>>()?;
        Ok(Self::Columns(columns))
    }
}

/// A single `column = value` equality condition.
#[derive(Debug, Clone)]
pub struct Filter {
    column: Ident,
    value: TextValue,
}

impl Filter {
    pub fn new(column: impl IntoIdent, value: impl Into<TextValue>) -> TableResult<Self> {
        Ok(Self {
            column: column.into_ident()?,
            value: value.into(),
        })
    }

    pub fn column(&self) -> &Ident {
        &self.column
    }

    pub fn value(&self) -> &str {
        self.value.as_str()
    }

    fn append_to(&self, q: &mut Query) {
        q.push(" WHERE ")
            .push_ident(&self.column)
            .push(" = ")
            .push_bind(self.value.clone());
    }
}

/// Builds SELECT/INSERT/UPDATE/DELETE statements for one table.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    table: Ident,
    primary_key: Ident,
}

impl QueryBuilder {
    pub fn new(table: impl IntoIdent, primary_key: impl IntoIdent) -> TableResult<Self> {
        Ok(Self {
            table: table.into_ident()?,
            primary_key: primary_key.into_ident()?,
        })
    }

    pub fn from_idents(table: Ident, primary_key: Ident) -> Self {
        Self { table, primary_key }
    }

    pub fn table(&self) -> &Ident {
        &self.table
    }

    pub fn primary_key(&self) -> &Ident {
        &self.primary_key
    }

    /// `SELECT <projection> FROM <table> [WHERE <col> = $1]`
    pub fn build_select(&self, projection: Projection, filter: Option<Filter>) -> Query {
        let mut q = Query::new(StatementKind::Select, "SELECT ");
        match &projection {
            Projection::All => {
                q.push("*");
            }
            Projection::Columns(cols) => {
                q.push_ident_list(cols);
            }
        }
        q.push(" FROM ").push_ident(&self.table);
        if let Some(filter) = filter {
            filter.append_to(&mut q);
        }
        q
    }

    /// `INSERT INTO <table> (<cols>) VALUES ($1, ...) RETURNING *`
    pub fn build_insert(&self, values: &Assignments) -> TableResult<Query> {
        if values.is_empty() {
            return Err(TableError::no_data("INSERT requires at least one column"));
        }

        let mut q = Query::new(StatementKind::Insert, "INSERT INTO ");
        q.push_ident(&self.table).push(" (");
        q.push_ident_list(values.iter().map(|(c, _)| c));
        q.push(") VALUES (");
        for (i, (_, v)) in values.iter().enumerate() {
            if i > 0 {
                q.push(", ");
            }
            q.push_bind(v.clone());
        }
        q.push(")").push_returning();
        Ok(q)
    }

    /// `UPDATE <table> SET <col> = $1, ... WHERE <pk> = $n RETURNING *`
    pub fn build_update(
        &self,
        values: &Assignments,
        primary_key_value: impl Into<TextValue>,
    ) -> TableResult<Query> {
        if values.is_empty() {
            return Err(TableError::no_data("UPDATE requires at least one SET column"));
        }

        let mut q = Query::new(StatementKind::Update, "UPDATE ");
        q.push_ident(&self.table).push(" SET ");
        for (i, (c, v)) in values.iter().enumerate() {
            if i > 0 {
                q.push(", ");
            }
            q.push_ident(c).push(" = ").push_bind(v.clone());
        }
        q.push(" WHERE ")
            .push_ident(&self.primary_key)
            .push(" = ")
            .push_bind(primary_key_value)
            .push_returning();
        Ok(q)
    }

    /// `DELETE FROM <table> WHERE <col> = $1 RETURNING *`, or `DELETE FROM <table>`
    /// when `filter` is `None`.
    ///
    /// The unfiltered form removes every row. Callers are responsible for
    /// confirming it with a human first.
    pub fn build_delete(&self, filter: Option<Filter>) -> Query {
        let mut q = Query::new(StatementKind::Delete, "DELETE FROM ");
        q.push_ident(&self.table);
        if let Some(filter) = filter {
            filter.append_to(&mut q);
            q.push_returning();
        }
        q
    }
}
