//! Source file formats for ingestion.
//!
//! A format is chosen by tag at startup through [`SourceKind`]; each format
//! implements [`SourceFormat`], which turns a path and a text encoding into the
//! rows that passed validation.

mod csv;
mod decode;

pub use self::csv::CsvSource;

use crate::error::{TableError, TableResult};
use crate::record::Record;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Produces validated rows from a source file.
pub trait SourceFormat {
    /// Read the source, drop rows that fail validation (logging them), and return the rest.
    fn accepted_rows(&self) -> TableResult<Vec<Record>>;
}

/// Rows of a source file split by email validity.
#[derive(Debug, Clone, Default)]
pub struct Partition {
    pub accepted: Vec<Record>,
    pub rejected: Vec<Record>,
}

impl Partition {
    /// Log the rejected rows and keep the accepted ones.
    pub fn into_accepted(self) -> Vec<Record> {
        tracing::warn!(
            "{} rows failed email validation check",
            self.rejected.len()
        );
        for row in &self.rejected {
            tracing::warn!(%row, "invalid email");
        }
        self.accepted
    }
}

/// Supported source formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Csv,
}

impl SourceKind {
    pub const ALL: &'static [SourceKind] = &[SourceKind::Csv];

    pub fn name(self) -> &'static str {
        match self {
            Self::Csv => "csv",
        }
    }

    /// Build the handler for this format.
    pub fn open(self, path: impl AsRef<Path>, encoding: &str) -> Box<dyn SourceFormat> {
        match self {
            Self::Csv => Box::new(CsvSource::new(path, encoding)),
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SourceKind {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let supported: Vec<_> = Self::ALL.iter().map(|k| k.name()).collect();
                TableError::validation(format!(
                    "unsupported file type '{s}' (supported: {})",
                    supported.join(", ")
                ))
            })
    }
}
