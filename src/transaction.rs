use std::cell::Cell;

use tracing::warn;

use crate::error::DbLibError;
use crate::statement::Statement;
use crate::types::{TransactionParams, TransactionState};

/// Tracks a transaction's state behind `&self`, so statements can borrow the transaction
/// while it is committed and restarted.
#[derive(Debug, Default)]
pub struct TransactionTracker {
    state: Cell<TransactionState>,
}

impl TransactionTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> TransactionState {
        self.state.get()
    }

    #[must_use]
    pub fn started(&self) -> bool {
        self.state.get() == TransactionState::Started
    }

    pub fn set(&self, state: TransactionState) {
        self.state.set(state);
    }

    /// # Errors
    /// `DbLibError::Sequence` if the transaction is not running.
    pub fn check_started(&self) -> Result<(), DbLibError> {
        if self.started() {
            Ok(())
        } else {
            Err(DbLibError::sequence("Transaction is not started"))
        }
    }

    /// # Errors
    /// `DbLibError::Sequence` if the transaction is already running.
    pub fn check_not_started(&self) -> Result<(), DbLibError> {
        if self.started() {
            Err(DbLibError::sequence("Transaction is already started"))
        } else {
            Ok(())
        }
    }
}

/// A unit of work on one connection; statements are created from it.
pub trait Transaction {
    type Stmt<'t>: Statement
    where
        Self: 't;

    /// # Errors
    /// `Sequence` if already started, or backend errors.
    fn start(&self) -> Result<(), DbLibError>;

    /// # Errors
    /// `Sequence` if not started, or backend errors.
    fn commit(&self) -> Result<(), DbLibError>;

    /// # Errors
    /// `Sequence` if not started, or backend errors.
    fn rollback(&self) -> Result<(), DbLibError>;

    fn state(&self) -> TransactionState;

    fn params(&self) -> &TransactionParams;

    fn create_statement(&self) -> Self::Stmt<'_>;

    fn started(&self) -> bool {
        self.state() == TransactionState::Started
    }

    /// # Errors
    /// As [`Transaction::commit`] then [`Transaction::start`].
    fn commit_and_start(&self) -> Result<(), DbLibError> {
        self.commit()?;
        self.start()
    }

    /// # Errors
    /// As [`Transaction::rollback`] then [`Transaction::start`].
    fn rollback_and_start(&self) -> Result<(), DbLibError> {
        self.rollback()?;
        self.start()
    }

    /// Create a statement and prepare `sql` on it.
    ///
    /// # Errors
    /// See [`Statement::prepare`].
    fn prepare(&self, sql: &str) -> Result<Self::Stmt<'_>, DbLibError> {
        let mut stmt = self.create_statement();
        stmt.prepare(sql)?;
        Ok(stmt)
    }

    /// Run `sql` once in a throwaway statement.
    ///
    /// # Errors
    /// See [`Statement::execute`].
    fn execute_immediate(&self, sql: &str) -> Result<(), DbLibError> {
        self.create_statement().execute(sql)
    }
}

/// Commit or roll back a transaction that is still running when it goes out of scope.
pub(crate) fn finish_on_drop<T: Transaction + ?Sized>(tx: &T) {
    if !tx.started() {
        return;
    }
    let result = if tx.params().auto_commit_on_destroy {
        tx.commit()
    } else {
        tx.rollback()
    };
    if let Err(e) = result {
        warn!(error = %e, "failed to finish transaction on drop");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracker_enforces_order() {
        let tracker = TransactionTracker::new();
        assert!(tracker.check_started().is_err());
        assert!(tracker.check_not_started().is_ok());

        tracker.set(TransactionState::Started);
        assert!(matches!(
            tracker.check_not_started(),
            Err(DbLibError::Sequence(msg)) if msg == "Transaction is already started"
        ));

        tracker.set(TransactionState::Committed);
        assert!(tracker.check_not_started().is_ok());
        assert_eq!(tracker.state(), TransactionState::Committed);
    }
}
