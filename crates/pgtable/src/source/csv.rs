use super::decode::{DecodeReader, encoding_for_label};
use super::{Partition, SourceFormat};
use crate::email::{EMAIL_COLUMN, is_valid_email};
use crate::error::{TableError, TableResult};
use crate::record::Record;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

/// A CSV file with a header row, read in the given text encoding.
///
/// Rows are streamed one at a time; the file is never held in memory as a whole.
/// Short rows are padded with NULLs and extra trailing fields are ignored.
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
    encoding: String,
}

impl CsvSource {
    pub fn new(path: impl AsRef<Path>, encoding: &str) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            encoding: encoding.to_string(),
        }
    }

    /// Split the file's rows into valid-email and invalid-email groups.
    pub fn partition(&self) -> TableResult<Partition> {
        let encoding = encoding_for_label(&self.encoding)?;
        let file = File::open(&self.path).map_err(|e| {
            io::Error::new(e.kind(), format!("{}: {e}", self.path.display()))
        })?;

        let mut reader = ::csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(DecodeReader::new(file, encoding));

        let headers = reader.headers()?.clone();
        let email_idx = headers
            .iter()
            .position(|h| h == EMAIL_COLUMN)
            .ok_or_else(|| TableError::MissingColumn(EMAIL_COLUMN.to_string()))?;

        let mut partition = Partition::default();
        for row in reader.records() {
            let row = row?;
            let mut record = Record::new();
            for (idx, column) in headers.iter().enumerate() {
                record.push(column, row.get(idx).map(str::to_string));
            }

            if is_valid_email(row.get(email_idx).unwrap_or_default()) {
                partition.accepted.push(record);
            } else {
                partition.rejected.push(record);
            }
        }

        tracing::info!(
            path = %self.path.display(),
            accepted = partition.accepted.len(),
            rejected = partition.rejected.len(),
            "read source file"
        );
        Ok(partition)
    }
}

impl SourceFormat for CsvSource {
    fn accepted_rows(&self) -> TableResult<Vec<Record>> {
        Ok(self.partition()?.into_accepted())
    }
}
