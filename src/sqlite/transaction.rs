use tracing::debug;

use super::connection::SqliteConnection;
use super::statement::SqliteStatement;
use crate::error::DbLibError;
use crate::transaction::{Transaction, TransactionTracker, finish_on_drop};
use crate::types::{TransactionParams, TransactionState};

/// Transaction on a borrowed `SQLite` connection.
///
/// `SQLite` has no isolation levels to choose from; the lock timeout becomes the busy timeout.
pub struct SqliteTransaction<'c> {
    conn: &'c SqliteConnection,
    params: TransactionParams,
    tracker: TransactionTracker,
}

impl<'c> SqliteTransaction<'c> {
    pub(crate) fn new(conn: &'c SqliteConnection, params: TransactionParams) -> Self {
        Self {
            conn,
            params,
            tracker: TransactionTracker::new(),
        }
    }

    fn run(&self, sql: &str) -> Result<(), DbLibError> {
        debug!(sql, "sqlite transaction control");
        self.conn.conn.execute_batch(sql)?;
        Ok(())
    }
}

impl Transaction for SqliteTransaction<'_> {
    type Stmt<'t>
        = SqliteStatement<'t>
    where
        Self: 't;

    fn start(&self) -> Result<(), DbLibError> {
        self.tracker.check_not_started()?;
        self.run("BEGIN")?;
        self.tracker.set(TransactionState::Started);
        Ok(())
    }

    fn commit(&self) -> Result<(), DbLibError> {
        self.tracker.check_started()?;
        self.run("COMMIT")?;
        self.tracker.set(TransactionState::Committed);
        Ok(())
    }

    fn rollback(&self) -> Result<(), DbLibError> {
        self.tracker.check_started()?;
        self.run("ROLLBACK")?;
        self.tracker.set(TransactionState::RolledBack);
        Ok(())
    }

    fn state(&self) -> TransactionState {
        self.tracker.state()
    }

    fn params(&self) -> &TransactionParams {
        &self.params
    }

    fn create_statement(&self) -> SqliteStatement<'_> {
        SqliteStatement::new(&self.conn.conn)
    }
}

impl Drop for SqliteTransaction<'_> {
    fn drop(&mut self) {
        finish_on_drop(self);
        self.conn.release_transaction();
    }
}
