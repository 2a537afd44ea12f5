use thiserror::Error;

/// Errors that can occur during warehouse operations.
#[derive(Debug, Error)]
pub enum WarehouseError {
    /// `DuckDB` database error.
    #[error(transparent)]
    DuckDb(#[from] ::duckdb::Error),

    /// I/O error (file system operations).
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Query was rejected due to policy violation.
    #[error("query rejected: {0}")]
    QueryRejected(String),

    /// Query execution timed out.
    #[error("query timed out after {timeout_ms}ms")]
    QueryTimeout { timeout_ms: u64 },

    /// A raw feed holds the same `(country, date)` more than once.
    #[error("duplicate key ({country}, {date}) while rebuilding {table}")]
    DuplicateKey {
        table: &'static str,
        country: String,
        date: String,
    },

    /// A raw source table the normalizer reads from does not exist.
    #[error("raw source table '{0}' does not exist")]
    MissingSource(String),

    /// A configured table name is not a plain SQL identifier.
    #[error("'{0}' is not a valid table name")]
    InvalidIdentifier(String),

    /// A view returned a row that does not fit its typed shape.
    #[error("invalid row in {view}: {message}")]
    InvalidRow { view: &'static str, message: String },
}

impl WarehouseError {
    /// Whether the error comes from rejecting the raw feed contents.
    pub const fn is_load_error(&self) -> bool {
        matches!(self, Self::DuplicateKey { .. } | Self::MissingSource(_))
    }
}
