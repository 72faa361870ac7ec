//! Async client for tabular, multi-dataset REST statistics services.
//!
//! One service response carries several independently-named tables, each
//! described by a column schema and a loosely-typed row set; large tables are
//! served in offset/limit pages. This crate builds and issues the requests,
//! retries transient transport failures, drives pagination to exhaustion,
//! and decodes every table into a strongly-typed in-memory model that
//! downstream consumers (such as a columnar-dataframe adapter) can use
//! without re-parsing JSON.
//!
//! ```no_run
//! use quay_client::{Client, ClientConfig, Query};
//!
//! # async fn run() -> Result<(), quay_client::error::ClientError> {
//! let client = Client::new(ClientConfig::new("https://iss.example.com"))?;
//! let query = Query::new("iss/engines/stock/markets/shares/securities")
//!     .with_tables(["securities", "marketdata"]);
//! let result = client.query(&query).await?;
//! if let Some(securities) = result.table("securities") {
//!     println!("{} rows", securities.row_count());
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod index;
mod paginate;
pub mod query;
pub mod response;
pub mod retry;
pub mod table;
pub mod transport;
pub mod value;

pub use client::Client;
pub use config::ClientConfig;
pub use index::IndexedTable;
pub use paginate::Pagination;
pub use query::{Query, TableSelection};
pub use response::{ResultSet, TableEntry};
pub use table::{ColumnSchema, Row, Table};
pub use value::{TypeTag, Value};
