//! # pgtable
//!
//! Single-table PostgreSQL access: parameterized CRUD through a lazily connected
//! gateway, and bulk ingestion of email-validated CSV rows.
//!
//! ## Features
//!
//! - **Quoted identifiers**: table and column names are always emitted as quoted identifiers
//! - **Bound values**: user input reaches the server only as parameters, typed by the server
//! - **One transaction per statement**: commit on success, rollback on error
//! - **Streaming ingestion**: CSV sources are decoded and validated row by row
//! - **Bulk load**: validated rows are staged to CSV and copied with `COPY ... FROM STDIN`
//!
//! ## CRUD
//!
//! ```ignore
//! use pgtable::{Assignments, ConnectParams, Filter, Gateway, TableDescriptor, TableGateway};
//!
//! let params = ConnectParams::new("localhost", "trustpilot", "postgres");
//! let descriptor = TableDescriptor::new(params, "reviews", "email_address")?;
//! let qb = descriptor.query_builder();
//! let mut gateway = TableGateway::new(descriptor);
//!
//! let mut values = Assignments::new();
//! values.set("email_address", "john@example.com")?.set("country", "DK")?;
//! gateway.insert(&qb.build_insert(&values)?).await?;
//!
//! let filter = Filter::new("email_address", "john@example.com")?;
//! gateway.delete(&qb.build_delete(Some(filter))).await?;
//! ```
//!
//! ## Ingestion
//!
//! ```ignore
//! use pgtable::{BatchLoader, LoaderConfig, SourceKind};
//!
//! let rows = SourceKind::Csv.open("reviews.csv", "utf-8").accepted_rows()?;
//! let report = BatchLoader::new(LoaderConfig::from_env()?, "reviews.csv")?
//!     .process(&rows)
//!     .await?;
//! ```

pub mod builder;
pub mod conn;
pub mod email;
pub mod error;
pub mod gateway;
pub mod ident;
pub mod loader;
pub mod query;
pub mod record;
pub mod source;
pub mod value;

pub use builder::{Filter, Projection, QueryBuilder};
pub use conn::{ConnectParams, TableDescriptor, connect};
pub use email::{EMAIL_COLUMN, is_valid_email};
pub use error::{TableError, TableResult};
pub use gateway::{Gateway, TableGateway};
pub use ident::{Ident, IntoIdent};
pub use loader::{BatchLoader, LoadReport, LoaderConfig, staged_file_name};
pub use query::{Query, StatementKind};
pub use record::{Assignments, Record};
pub use source::{CsvSource, Partition, SourceFormat, SourceKind};
pub use value::{CellText, TextValue};
