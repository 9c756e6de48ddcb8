//! Statement execution against one table.
//!
//! [`TableGateway`] opens its connection on first use and keeps it for its whole
//! lifetime. Every statement runs in its own transaction; the statement's result
//! decides the outcome:
//!
//! - `Ok(_)`: commit, then return the decoded rows
//! - `Err(_)`: roll back, then return [`TableError::QueryExecution`] with the driver error
//!
//! # Example
//!
//! ```ignore
//! use pgtable::{ConnectParams, Gateway, Projection, TableDescriptor, TableGateway};
//!
//! let params = ConnectParams::new("localhost", "trustpilot", "postgres");
//! let descriptor = TableDescriptor::new(params, "reviews", "email_address")?;
//! let qb = descriptor.query_builder();
//! let mut gateway = TableGateway::new(descriptor);
//!
//! let rows = gateway.select(&qb.build_select(Projection::All, None)).await?;
//! ```

use crate::conn::{TableDescriptor, connect};
use crate::error::{TableError, TableResult};
use crate::ident::quote_ident;
use crate::query::{Query, StatementKind};
use crate::record::Record;
use crate::value::{CellText, TextValue, type_sql};
use tokio_postgres::types::Type;
use tokio_postgres::{Client, Transaction};

/// The four table operations the CRUD shell drives.
///
/// Each takes a built [`Query`] of the matching kind and returns the rows it
/// produced: all rows for SELECT, the affected rows for statements with a
/// RETURNING clause, and nothing otherwise.
pub trait Gateway {
    fn select(
        &mut self,
        query: &Query,
    ) -> impl std::future::Future<Output = TableResult<Vec<Record>>> + Send;

    fn insert(
        &mut self,
        query: &Query,
    ) -> impl std::future::Future<Output = TableResult<Vec<Record>>> + Send;

    fn update(
        &mut self,
        query: &Query,
    ) -> impl std::future::Future<Output = TableResult<Vec<Record>>> + Send;

    fn delete(
        &mut self,
        query: &Query,
    ) -> impl std::future::Future<Output = TableResult<Vec<Record>>> + Send;
}

/// A lazily connected, single-connection gateway for one table.
pub struct TableGateway {
    descriptor: TableDescriptor,
    client: Option<Client>,
}

impl TableGateway {
    pub fn new(descriptor: TableDescriptor) -> Self {
        Self {
            descriptor,
            client: None,
        }
    }

    pub fn descriptor(&self) -> &TableDescriptor {
        &self.descriptor
    }

    pub fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    /// Connect if this gateway has not connected yet.
    pub async fn ensure_connected(&mut self) -> TableResult<&mut Client> {
        let client = match self.client.take() {
            Some(client) => client,
            None => connect(self.descriptor.params()).await?,
        };
        Ok(self.client.insert(client))
    }

    async fn run(&mut self, expected: StatementKind, query: &Query) -> TableResult<Vec<Record>> {
        if query.kind() != expected {
            return Err(TableError::validation(format!(
                "expected a {expected} statement, got {}",
                query.kind()
            )));
        }
        self.execute(query).await
    }

    /// Execute `query` in its own transaction.
    pub async fn execute(&mut self, query: &Query) -> TableResult<Vec<Record>> {
        tracing::info!(
            target: "pgtable.sql",
            kind = %query.kind(),
            param_count = query.params().len(),
            sql = %query.to_sql(),
        );

        let client = self.ensure_connected().await?;
        let tx = client.transaction().await?;

        match run_statement(&tx, query).await {
            Ok(records) => {
                tx.commit().await?;
                Ok(records)
            }
            Err(err) => {
                tracing::warn!(target: "pgtable.sql", "{err}");
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::warn!(target: "pgtable.sql", "rollback failed: {rollback_err}");
                }
                Err(err)
            }
        }
    }
}

/// Prepare, bind and decode one statement.
///
/// Parameters whose inferred type has no text conversion on the client are
/// cast on the server (`NULLIF($n::text, '')::type`). Result columns of such types are
/// rendered by the server through an outer `::text` projection.
async fn run_statement(tx: &Transaction<'_>, query: &Query) -> TableResult<Vec<Record>> {
    let mut sql = query.to_sql();
    let mut statement = tx.prepare(&sql).await?;

    let casts: Vec<Option<String>> = statement
        .params()
        .iter()
        .map(|ty| (!TextValue::binds_directly(ty)).then(|| type_sql(ty)))
        .collect();
    if casts.iter().any(Option::is_some) {
        sql = query.to_sql_with_casts(&casts);
        tracing::debug!(target: "pgtable.sql", sql = %sql, "casting parameters on the server");
        statement = tx.prepare(&sql).await?;
    }

    let params = query.params_ref();
    if !query.returns_rows() {
        let affected = tx.execute(&statement, &params).await?;
        tracing::info!(target: "pgtable.sql", affected, "statement applied");
        return Ok(Vec::new());
    }

    let columns = statement.columns();
    if !columns.iter().all(|c| CellText::decodes_directly(c.type_())) {
        let wrapped = text_columns_sql(&sql, columns.iter().map(|c| (c.name(), c.type_())));
        tracing::debug!(target: "pgtable.sql", sql = %wrapped, "rendering columns as text");
        statement = tx.prepare(&wrapped).await?;
    }

    tx.query(&statement, &params)
        .await?
        .iter()
        .map(Record::from_row)
        .collect()
}

/// Wrap a row-returning statement so the listed columns come back as text.
fn text_columns_sql<'a>(
    inner: &str,
    columns: impl IntoIterator<Item = (&'a str, &'a Type)>,
) -> String {
    let projection = columns
        .into_iter()
        .map(|(name, ty)| {
            let column = quote_ident(name);
            if CellText::decodes_directly(ty) {
                column
            } else {
                format!("{column}::text AS {column}")
            }
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!(r#"WITH "rows" AS ({inner}) SELECT {projection} FROM "rows""#)
}

impl Gateway for TableGateway {
    async fn select(&mut self, query: &Query) -> TableResult<Vec<Record>> {
        self.run(StatementKind::Select, query).await
    }

    async fn insert(&mut self, query: &Query) -> TableResult<Vec<Record>> {
        self.run(StatementKind::Insert, query).await
    }

    async fn update(&mut self, query: &Query) -> TableResult<Vec<Record>> {
        self.run(StatementKind::Update, query).await
    }

    async fn delete(&mut self, query: &Query) -> TableResult<Vec<Record>> {
        self.run(StatementKind::Delete, query).await
    }
}
