//! Composed statements with bound parameters.
//!
//! [`Query`] stores SQL pieces and parameters separately and generates
//! `$1, $2, ...` placeholders when rendered, so user-supplied values never
//! become part of the SQL text.
//!
//! # Example
//!
//! ```ignore
//! use pgtable::{Ident, Query, StatementKind};
//!
//! let mut q = Query::new(StatementKind::Select, "SELECT * FROM ");
//! q.push_ident(&Ident::new("reviews")?)
//!     .push(" WHERE ")
//!     .push_ident(&Ident::new("country")?)
//!     .push(" = ")
//!     .push_bind("DK");
//!
//! assert_eq!(q.to_sql(), r#"SELECT * FROM "reviews" WHERE "country" = $1"#);
//! ```

use crate::ident::Ident;
use crate::value::TextValue;
use std::fmt;
use tokio_postgres::types::ToSql;

/// The statement a [`Query`] carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Select => "SELECT",
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        })
    }
}

#[derive(Debug, Clone)]
enum SqlPart {
    Raw(String),
    Param,
}

/// A parameter-safe SQL statement.
#[derive(Debug, Clone)]
pub struct Query {
    kind: StatementKind,
    parts: Vec<SqlPart>,
    params: Vec<TextValue>,
    returns_rows: bool,
}

impl Query {
    /// Create a new statement with an initial SQL fragment.
    ///
    /// `SELECT` statements always return rows; other kinds only after
    /// [`Query::push_returning`].
    pub fn new(kind: StatementKind, initial_sql: impl Into<String>) -> Self {
        Self {
            kind,
            parts: vec![SqlPart::Raw(initial_sql.into())],
            params: Vec::new(),
            returns_rows: kind == StatementKind::Select,
        }
    }

    /// Append raw SQL (no parameters).
    pub fn push(&mut self, sql: &str) -> &mut Self {
        if sql.is_empty() {
            return self;
        }

        match self.parts.last_mut() {
            Some(SqlPart::Raw(last)) => last.push_str(sql),
            _ => self.parts.push(SqlPart::Raw(sql.to_string())),
        }
        self
    }

    /// Append a quoted identifier.
    pub fn push_ident(&mut self, ident: &Ident) -> &mut Self {
        let mut s = String::new();
        ident.write_sql(&mut s);
        self.push(&s)
    }

    /// Append identifiers separated by `", "`.
    pub fn push_ident_list<'a>(&mut self, idents: impl IntoIterator<Item = &'a Ident>) -> &mut Self {
        for (i, ident) in idents.into_iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.push_ident(ident);
        }
        self
    }

    /// Append a parameter placeholder and bind its value.
    pub fn push_bind(&mut self, value: impl Into<TextValue>) -> &mut Self {
        self.parts.push(SqlPart::Param);
        self.params.push(value.into());
        self
    }

    /// Append `RETURNING *` and mark the statement as row-returning.
    pub fn push_returning(&mut self) -> &mut Self {
        self.returns_rows = true;
        self.push(" RETURNING *")
    }

    pub fn kind(&self) -> StatementKind {
        self.kind
    }

    /// Whether execution yields rows (SELECT or a RETURNING clause).
    pub fn returns_rows(&self) -> bool {
        self.returns_rows
    }

    /// Render SQL with `$1, $2, ...` placeholders.
    pub fn to_sql(&self) -> String {
        self.render(&[])
    }

    /// Render SQL, casting placeholder `i` as `NULLIF($n::text, '')::<type>` when
    /// `casts[i]` is set.
    ///
    /// The server then parses the bound text itself, for types that cannot be
    /// encoded on the client. Empty input still becomes NULL.
    pub fn to_sql_with_casts(&self, casts: &[Option<String>]) -> String {
        self.render(casts)
    }

    fn render(&self, casts: &[Option<String>]) -> String {
        use std::fmt::Write;

        let mut out = String::new();
        let mut idx: usize = 0;

        for part in &self.parts {
            match part {
                SqlPart::Raw(s) => out.push_str(s),
                SqlPart::Param => {
                    idx += 1;
                    match casts.get(idx - 1) {
                        Some(Some(ty)) => {
                            let _ = write!(&mut out, "NULLIF(${idx}::text, '')::{ty}");
                        }
                        _ => {
                            let _ = write!(&mut out, "${}", idx);
                        }
                    }
                }
            }
        }
        out
    }

    /// Bound values in placeholder order.
    pub fn params(&self) -> &[TextValue] {
        &self.params
    }

    /// Parameter refs compatible with `tokio-postgres`.
    pub fn params_ref(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params
            .iter()
            .map(|p| p as &(dyn ToSql + Sync))
            .collect()
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}
