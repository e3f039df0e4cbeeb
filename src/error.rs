use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbLibError {
    #[cfg(feature = "postgres")]
    #[error(transparent)]
    PostgresError(#[from] tokio_postgres::Error),

    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[cfg(feature = "mssql")]
    #[error(transparent)]
    MssqlError(#[from] tiberius::error::Error),

    /// Numeric narrowing overflow; the message names both types and the target bounds.
    #[error("{0}")]
    RangeExceeded(String),

    #[error("Can't convert from {from} to {to}")]
    TypeConversion { from: String, to: String },

    #[error("Parameter not found: {0}")]
    ParameterNotFound(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    /// Operation invoked while the statement or transaction is in the wrong state.
    #[error("{0}")]
    Sequence(String),

    #[error("Column value is null: {0}")]
    ColumnValueIsNull(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),

    #[error("Unimplemented feature: {0}")]
    Unimplemented(String),

    #[error("Other database error: {0}")]
    Other(String),
}

impl DbLibError {
    pub(crate) fn type_conversion(from: impl ToString, to: impl ToString) -> Self {
        DbLibError::TypeConversion {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    pub(crate) fn sequence(msg: &str) -> Self {
        DbLibError::Sequence(msg.to_string())
    }
}
