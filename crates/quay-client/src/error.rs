use thiserror::Error;

pub type CoercionResult<T> = Result<T, CoercionError>;

/// A cell value could not be coerced to its column's declared type.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoercionError {
    #[error("value is not numeric: {0}")]
    NotNumeric(String),
    #[error("bad temporal format: {0}")]
    BadFormat(String),
    #[error("value is not a boolean: {0}")]
    NotBoolean(String),
    #[error("value is not text: {0}")]
    NotText(String),
}

pub type TableResult<T> = Result<T, TableError>;

/// A single table block could not be decoded.
/// Table errors never abort sibling tables in the same response.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TableError {
    #[error("malformed schema: {0}")]
    MalformedSchema(String),
    #[error("row {row} has {actual} cells, expected {expected}")]
    RowArityMismatch {
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[error("failed to decode cell at row {row}, column {column}: {source}")]
    CellDecodeFailed {
        row: usize,
        column: usize,
        source: CoercionError,
    },
}

pub type ResponseResult<T> = Result<T, ResponseError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResponseError {
    #[error("malformed response envelope: {0}")]
    MalformedEnvelope(String),
    #[error("response does not contain table '{table}'")]
    MissingTable { table: String },
}

pub type PaginationResult<T> = Result<T, PaginationError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PaginationError {
    #[error("pagination exceeded maximum page count ({pages})")]
    CeilingExceeded { pages: usize },
    #[error("page schema does not match the first page of table '{table}'")]
    PageSchemaMismatch { table: String },
    #[error("pagination cursor did not advance")]
    CursorStalled,
    #[error("bad date column '{column}': {reason}")]
    BadDateColumn { column: String, reason: String },
}

pub type TransportResult<T> = Result<T, TransportError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransportError {
    #[error("request failed with status {status}")]
    ClientError { status: u16 },
    #[error("request deadline exceeded")]
    Timeout,
    #[error("retries exhausted after {attempts} attempts: {last}")]
    Exhausted { attempts: usize, last: String },
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

/// Why one table in a result set could not be fetched.
///
/// Fetch failures are surfaced as data inside an otherwise successful
/// [`ResultSet`](crate::response::ResultSet) entry, so one bad table never
/// hides good data in its siblings.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    #[error(transparent)]
    Table(#[from] TableError),
    #[error(transparent)]
    Response(#[from] ResponseError),
    #[error(transparent)]
    Pagination(#[from] PaginationError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

pub type IndexResult<T> = Result<T, IndexError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum IndexError {
    #[error("table doesn't have column '{0}'")]
    NoSuchColumn(String),
    #[error("index column contains a null value at row {0}")]
    NullKey(usize),
    #[error("key type does not match the index column values")]
    KeyTypeMismatch,
}

pub type ClientResult<T> = Result<T, ClientError>;

/// A whole client call failed; no result set was produced.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClientError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("invalid query: {0}")]
    InvalidQuery(String),
    #[error("discovery response is unusable: {0}")]
    BadDiscovery(String),
    #[error("no table could be fetched: {0}")]
    TotalUnavailable(String),
    #[error("query cancelled before completion")]
    Cancelled,
    #[error("failed to fetch table '{table}': {source}")]
    TableFetchFailed { table: String, source: FetchError },
}

impl ClientError {
    pub fn invalid_config(message: impl Into<String>) -> Self {
        ClientError::InvalidConfig(message.into())
    }

    pub fn invalid_query(message: impl Into<String>) -> Self {
        ClientError::InvalidQuery(message.into())
    }
}
