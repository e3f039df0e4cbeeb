use serde::{Deserialize, Serialize};

use super::connection::SqliteConnection;
use crate::error::DbLibError;

/// Options for opening a `SQLite` database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqliteOptions {
    /// File path, or `:memory:`.
    pub db_path: String,
    /// Switch the database to write-ahead logging on open.
    #[serde(default)]
    pub wal: bool,
}

impl SqliteOptions {
    #[must_use]
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
            wal: false,
        }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(":memory:")
    }

    #[must_use]
    pub fn with_wal(mut self, wal: bool) -> Self {
        self.wal = wal;
        self
    }

    #[must_use]
    pub fn is_in_memory(&self) -> bool {
        self.db_path == ":memory:"
    }

    /// Open the database described by these options.
    ///
    /// # Errors
    /// Returns `DbLibError::ConnectionError` if the file cannot be opened.
    pub fn connect(&self) -> Result<SqliteConnection, DbLibError> {
        SqliteConnection::open(self.clone())
    }
}
