//! Bulk loading of validated rows into the `reviews` table.
//!
//! [`BatchLoader::process`] runs three steps in order:
//!
//! 1. [`BatchLoader::ensure_table`]: `CREATE TABLE IF NOT EXISTS` with a fixed schema
//! 2. [`BatchLoader::stage`]: write the rows to an intermediate CSV file
//! 3. [`BatchLoader::bulk_load`]: stream that file through `COPY ... FROM STDIN`
//!
//! Each database step opens its own connection and drops it when done. A failed
//! copy is rolled back and logged; the table created in step 1 stays.

use crate::conn::{ConnectParams, connect};
use crate::error::{TableError, TableResult};
use crate::ident::Ident;
use crate::record::Record;
use bytes::Bytes;
use futures_util::SinkExt;
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;
use tokio_postgres::{Client, Transaction};

/// Destination table used when none is configured.
pub const DEFAULT_TABLE: &str = "reviews";

/// Columns of the destination table, all `text`.
pub const REVIEW_COLUMNS: [&str; 7] = [
    "reviewer_name",
    "review_title",
    "review_rating",
    "review_content",
    "email_address",
    "country",
    "review_date",
];

const PRIMARY_KEY: &str = "email_address";
const COPY_CHUNK: usize = 64 * 1024;

/// Where and how the loader writes.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    pub params: ConnectParams,
    pub table: String,
    /// Directory the intermediate CSV is written to.
    pub staging_dir: PathBuf,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            params: ConnectParams::new("localhost", "trustpilot", "postgres"),
            table: DEFAULT_TABLE.to_string(),
            staging_dir: PathBuf::from("."),
        }
    }
}

impl LoaderConfig {
    /// Defaults overridden by `PGTABLE_HOST`, `PGTABLE_PORT`, `PGTABLE_DATABASE`,
    /// `PGTABLE_USER`, `PGTABLE_PASSWORD`, `PGTABLE_TABLE` and `PGTABLE_STAGING_DIR`.
    pub fn from_env() -> TableResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> TableResult<Self> {
        let mut config = Self::default();
        if let Some(host) = lookup("PGTABLE_HOST") {
            config.params.host = host;
        }
        if let Some(port) = lookup("PGTABLE_PORT") {
            let port = port
                .trim()
                .parse::<u16>()
                .map_err(|e| TableError::validation(format!("PGTABLE_PORT '{port}': {e}")))?;
            config.params.port = Some(port);
        }
        if let Some(dbname) = lookup("PGTABLE_DATABASE") {
            config.params.dbname = dbname;
        }
        if let Some(user) = lookup("PGTABLE_USER") {
            config.params.user = user;
        }
        if let Some(password) = lookup("PGTABLE_PASSWORD") {
            config.params = config.params.password(password);
        }
        if let Some(table) = lookup("PGTABLE_TABLE") {
            config.table = table;
        }
        if let Some(dir) = lookup("PGTABLE_STAGING_DIR") {
            config.staging_dir = PathBuf::from(dir);
        }
        Ok(config)
    }
}

/// Outcome of [`BatchLoader::process`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    /// The intermediate CSV, left in place.
    pub staged: PathBuf,
    /// Rows copied, or `None` when the copy failed (already logged).
    pub copied: Option<u64>,
    /// Why the copy failed, including the server's message.
    pub failure: Option<String>,
}

impl LoadReport {
    pub fn is_loaded(&self) -> bool {
        self.copied.is_some()
    }
}

/// Name of the intermediate CSV for a source file: the base name up to its
/// first `.`, with `.csv` appended and spaces turned into `_`.
pub fn staged_file_name(source_name: &str) -> String {
    let base = Path::new(source_name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(source_name);
    let stem = base.split('.').next().unwrap_or(base);
    format!("{stem}.csv").replace(' ', "_")
}

/// Loads validated rows from one source file.
#[derive(Debug, Clone)]
pub struct BatchLoader {
    config: LoaderConfig,
    table: Ident,
    source: PathBuf,
}

impl BatchLoader {
    /// `source` is the file the rows were read from; the staged CSV is named after it.
    pub fn new(config: LoaderConfig, source: impl Into<PathBuf>) -> TableResult<Self> {
        let table = Ident::new(&config.table)?;
        Ok(Self {
            config,
            table,
            source: source.into(),
        })
    }

    pub fn table(&self) -> &Ident {
        &self.table
    }

    /// Path [`BatchLoader::stage`] writes to.
    ///
    /// Never the source file itself: when the derived name resolves to the
    /// source, `_staged` is appended to the stem.
    pub fn staged_path(&self) -> PathBuf {
        let name = staged_file_name(&self.source.to_string_lossy());
        let path = self.config.staging_dir.join(&name);
        if !same_file(&path, &self.source) {
            return path;
        }
        let stem = name.strip_suffix(".csv").unwrap_or(&name);
        self.config.staging_dir.join(format!("{stem}_staged.csv"))
    }

    pub(crate) fn create_table_sql(&self) -> TableResult<String> {
        let mut columns = Vec::with_capacity(REVIEW_COLUMNS.len());
        for name in REVIEW_COLUMNS {
            let mut col = Ident::new(name)?.to_sql();
            col.push_str(" text");
            if name == PRIMARY_KEY {
                col.push_str(" PRIMARY KEY");
            }
            columns.push(col);
        }
        Ok(format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            self.table.to_sql(),
            columns.join(", ")
        ))
    }

    pub(crate) fn copy_sql(&self, columns: &[Ident]) -> String {
        let columns: Vec<String> = columns.iter().map(Ident::to_sql).collect();
        format!(
            "COPY {} ({}) FROM STDIN WITH (FORMAT CSV, HEADER true)",
            self.table.to_sql(),
            columns.join(", ")
        )
    }

    /// Create the destination table if it does not exist. Safe to call repeatedly.
    pub async fn ensure_table(&self) -> TableResult<()> {
        let sql = self.create_table_sql()?;
        let client = connect(&self.config.params).await?;
        client.batch_execute(&sql).await?;
        tracing::info!(table = %self.table, "Table created or verified successfully");
        Ok(())
    }

    /// Write `rows` to the intermediate CSV (header from the first row's columns).
    pub fn stage(&self, rows: &[Record]) -> TableResult<PathBuf> {
        let Some(first) = rows.first() else {
            return Err(TableError::no_data(
                "no clean rows to stage for bulk load",
            ));
        };

        let path = self.staged_path();
        let headers: Vec<&str> = first.columns().collect();
        let mut writer = ::csv::Writer::from_path(&path)?;
        writer.write_record(&headers)?;
        for row in rows {
            writer.write_record(headers.iter().map(|h| row.get(h).unwrap_or_default()))?;
        }
        writer.flush()?;

        tracing::info!(path = %path.display(), rows = rows.len(), "staged rows for copy");
        Ok(path)
    }

    /// Copy a staged CSV into the table in one transaction.
    ///
    /// Columns are matched by the file's header. On failure the transaction is
    /// rolled back and the error is logged and returned.
    pub async fn bulk_load(&self, path: &Path) -> TableResult<u64> {
        match self.try_bulk_load(path).await {
            Ok(copied) => {
                tracing::info!(table = %self.table, copied, "Successfully copied data");
                Ok(copied)
            }
            Err(err) => {
                tracing::error!(
                    table = %self.table,
                    path = %path.display(),
                    "Error occurred during copy operation: {err}"
                );
                Err(err)
            }
        }
    }

    async fn try_bulk_load(&self, path: &Path) -> TableResult<u64> {
        let mut headers = ::csv::Reader::from_path(path)?;
        let columns = headers
            .headers()?
            .iter()
            .map(Ident::new)
            .collect::<TableResult<Vec<_>>>()?;
        let sql = self.copy_sql(&columns);

        let mut client = connect(&self.config.params).await?;
        tracing::info!(table = %self.table, "Starting table copy operation");
        copy_in_transaction(&mut client, &sql, path).await
    }

    /// Ensure the table, stage `rows`, then bulk load them.
    ///
    /// Empty input fails with [`TableError::NoData`] before any connection is
    /// made. A copy failure does not fail the call; it is logged and reported
    /// through [`LoadReport::copied`].
    pub async fn process(&self, rows: &[Record]) -> TableResult<LoadReport> {
        if rows.is_empty() {
            return Err(TableError::no_data(
                "no clean rows to load",
            ));
        }

        self.ensure_table().await?;
        let staged = self.stage(rows)?;
        let (copied, failure) = match self.bulk_load(&staged).await {
            Ok(copied) => (Some(copied), None),
            Err(err) => (None, Some(err.to_string())),
        };
        Ok(LoadReport {
            staged,
            copied,
            failure,
        })
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

async fn copy_in_transaction(client: &mut Client, sql: &str, path: &Path) -> TableResult<u64> {
    let tx = client.transaction().await?;
    match stream_file(&tx, sql, path).await {
        Ok(copied) => {
            tx.commit().await?;
            Ok(copied)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::warn!("copy rollback failed: {rollback_err}");
            }
            Err(err)
        }
    }
}

async fn stream_file(tx: &Transaction<'_>, sql: &str, path: &Path) -> TableResult<u64> {
    let mut file = tokio::fs::File::open(path).await?;
    let sink = tx.copy_in(sql).await?;
    futures_util::pin_mut!(sink);

    let mut buf = vec![0u8; COPY_CHUNK];
    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        sink.send(Bytes::copy_from_slice(&buf[..n])).await?;
    }
    Ok(sink.finish().await?)
}
