//! Safe SQL identifier handling.
//!
//! Postgres does not allow identifiers to be bound as parameters, so table and
//! column names typed at the prompt are carried as [`Ident`] values and always
//! rendered as quoted identifiers:
//!
//! - the name is wrapped in `"..."`
//! - embedded `"` is escaped as `""`
//! - empty names and names containing NUL are rejected when the `Ident` is built
//!
//! # Example
//! ```ignore
//! use pgtable::Ident;
//!
//! let c = Ident::new("email_address")?;
//! assert_eq!(c.to_sql(), r#""email_address""#);
//! # Ok::<(), pgtable::TableError>(())
//! ```

use crate::error::{TableError, TableResult};
use std::fmt;

/// A single quoted SQL identifier (table or column name).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ident {
    name: String,
}

impl Ident {
    /// Validate `name` and wrap it as an identifier.
    pub fn new(name: &str) -> TableResult<Self> {
        if name.is_empty() {
            return Err(TableError::validation("Identifier cannot be empty"));
        }
        if name.contains('\0') {
            return Err(TableError::validation(
                "Identifier cannot contain NUL character",
            ));
        }
        Ok(Self {
            name: name.to_string(),
        })
    }

    /// The unquoted name as supplied.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Render the identifier as SQL.
    pub fn to_sql(&self) -> String {
        let mut out = String::with_capacity(self.name.len() + 2);
        self.write_sql(&mut out);
        out
    }

    pub(crate) fn write_sql(&self, out: &mut String) {
        write_quoted(&self.name, out);
    }
}

fn write_quoted(name: &str, out: &mut String) {
    out.push('"');
    for ch in name.chars() {
        if ch == '"' {
            out.push('"');
            out.push('"');
        } else {
            out.push(ch);
        }
    }
    out.push('"');
}

/// Quote a name that comes from the server (column or type name).
pub(crate) fn quote_ident(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 2);
    write_quoted(name, &mut out);
    out
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Convert an input into an [`Ident`].
///
/// This is mainly for ergonomics in builder APIs.
pub trait IntoIdent {
    fn into_ident(self) -> TableResult<Ident>;
}

impl IntoIdent for Ident {
    fn into_ident(self) -> TableResult<Ident> {
        Ok(self)
    }
}

impl IntoIdent for &Ident {
    fn into_ident(self) -> TableResult<Ident> {
        Ok(self.clone())
    }
}

impl IntoIdent for &str {
    fn into_ident(self) -> TableResult<Ident> {
        Ident::new(self)
    }
}

impl IntoIdent for String {
    fn into_ident(self) -> TableResult<Ident> {
        Ident::new(&self)
    }
}

impl IntoIdent for &String {
    fn into_ident(self) -> TableResult<Ident> {
        Ident::new(self)
    }
}
