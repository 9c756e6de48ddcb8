//! Row values and write payloads.

use crate::error::{TableError, TableResult, error_chain};
use crate::ident::{Ident, IntoIdent};
use crate::value::{CellText, TextValue};
use std::fmt;
use tokio_postgres::Row;

/// An ordered column → text mapping.
///
/// Column names are unique; pushing an existing name replaces its value in place.
/// Order follows first insertion and is only used for display and CSV output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, Option<String>)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from `(column, value)` pairs.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut record = Self::new();
        for (k, v) in pairs {
            record.push(k, Some(v.into()));
        }
        record
    }

    /// Decode a result row, rendering every column as text.
    pub fn from_row(row: &Row) -> TableResult<Self> {
        let mut record = Self::new();
        for (idx, column) in row.columns().iter().enumerate() {
            let cell: Option<CellText> = row
                .try_get(idx)
                .map_err(|e| TableError::decode(column.name(), error_chain(&e)))?;
            record.push(column.name(), cell.map(CellText::into_string));
        }
        Ok(record)
    }

    /// Set a column, replacing any existing value for it.
    pub fn push(&mut self, column: impl Into<String>, value: Option<String>) {
        let column = column.into();
        match self.fields.iter_mut().find(|(name, _)| *name == column) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((column, value)),
        }
    }

    /// Value of `column`; `None` if the column is absent or NULL.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .and_then(|(_, v)| v.as_deref())
    }

    pub fn contains(&self, column: &str) -> bool {
        self.fields.iter().any(|(name, _)| name == column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = Option<&str>> {
        self.fields.iter().map(|(_, v)| v.as_deref())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.fields
            .iter()
            .map(|(name, v)| (name.as_str(), v.as_deref()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (name, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match value {
                Some(v) => write!(f, "{name}: {v:?}")?,
                None => write!(f, "{name}: NULL")?,
            }
        }
        f.write_str("}")
    }
}

/// Ordered `(column, value)` pairs for INSERT and UPDATE.
///
/// Column names are validated when they are added, so a payload that exists is
/// always safe to render.
#[derive(Debug, Clone, Default)]
pub struct Assignments {
    entries: Vec<(Ident, TextValue)>,
}

impl Assignments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a column value. Setting the same column again replaces the earlier value.
    pub fn set(&mut self, column: impl IntoIdent, value: impl Into<TextValue>) -> TableResult<&mut Self> {
        let column = column.into_ident()?;
        let value = value.into();
        match self.entries.iter_mut().find(|(c, _)| *c == column) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((column, value)),
        }
        Ok(self)
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(c, _)| c.name() == column)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Ident, &TextValue)> {
        self.entries.iter().map(|(c, v)| (c, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
