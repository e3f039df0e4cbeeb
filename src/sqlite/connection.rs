use std::cell::Cell;
use std::fmt;

use tracing::{debug, info};

use super::config::SqliteOptions;
use super::transaction::SqliteTransaction;
use crate::connection::Connection;
use crate::error::DbLibError;
use crate::transaction::Transaction;
use crate::types::{DatabaseType, TransactionParams};

/// An open `SQLite` database. At most one transaction runs on it at a time.
pub struct SqliteConnection {
    pub(crate) conn: rusqlite::Connection,
    in_transaction: Cell<bool>,
    options: SqliteOptions,
}

impl SqliteConnection {
    /// # Errors
    /// Returns `DbLibError::ConnectionError` if the database cannot be opened or configured.
    pub fn open(options: SqliteOptions) -> Result<Self, DbLibError> {
        let conn = if options.is_in_memory() {
            rusqlite::Connection::open_in_memory()
        } else {
            rusqlite::Connection::open(&options.db_path)
        }
        .map_err(|e| {
            DbLibError::ConnectionError(format!("Failed to open {}: {e}", options.db_path))
        })?;

        if options.wal && !options.is_in_memory() {
            conn.pragma_update(None, "journal_mode", "WAL")?;
        }
        info!(path = %options.db_path, "sqlite database opened");

        Ok(Self {
            conn,
            in_transaction: Cell::new(false),
            options,
        })
    }

    #[must_use]
    pub fn options(&self) -> &SqliteOptions {
        &self.options
    }

    /// The underlying rusqlite handle.
    #[must_use]
    pub fn raw(&self) -> &rusqlite::Connection {
        &self.conn
    }

    pub(crate) fn release_transaction(&self) {
        self.in_transaction.set(false);
    }

    fn ensure_not_in_tx(&self) -> Result<(), DbLibError> {
        if self.in_transaction.get() {
            Err(DbLibError::sequence(
                "Connection already has an active transaction",
            ))
        } else {
            Ok(())
        }
    }
}

impl Connection for SqliteConnection {
    type Tx<'c> = SqliteTransaction<'c>;

    fn db_type(&self) -> DatabaseType {
        DatabaseType::Sqlite
    }

    fn supports_sequences(&self) -> bool {
        false
    }

    fn open_transaction(
        &self,
        params: TransactionParams,
    ) -> Result<SqliteTransaction<'_>, DbLibError> {
        self.ensure_not_in_tx()?;
        self.conn.busy_timeout(params.effective_lock_time_out())?;
        debug!(?params, "sqlite transaction opened");
        self.in_transaction.set(true);
        let tx = SqliteTransaction::new(self, params);
        if tx.params().autostart {
            tx.start()?;
        }
        Ok(tx)
    }
}

impl fmt::Debug for SqliteConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteConnection")
            .field("db_path", &self.options.db_path)
            .field("in_transaction", &self.in_transaction.get())
            .finish_non_exhaustive()
    }
}
