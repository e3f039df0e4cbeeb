use std::fmt::Write as _;

use super::connection::MssqlConnection;
use super::statement::MssqlStatement;
use crate::error::DbLibError;
use crate::transaction::{Transaction, TransactionTracker, finish_on_drop};
use crate::types::{TransactionLevel, TransactionParams, TransactionState};

/// Transaction on a borrowed SQL Server session.
///
/// SQL Server has no read-only transactions, so `TransactionAccess` is not sent.
pub struct MssqlTransaction<'c> {
    conn: &'c MssqlConnection,
    params: TransactionParams,
    tracker: TransactionTracker,
}

/// Session settings sent ahead of `BEGIN TRANSACTION`.
#[must_use]
pub fn begin_sql(params: &TransactionParams) -> String {
    let mut sql = String::new();
    let level = match params.level {
        TransactionLevel::Default => None,
        TransactionLevel::Serializable => Some("SERIALIZABLE"),
        TransactionLevel::RepeatableRead => Some("REPEATABLE READ"),
        TransactionLevel::ReadCommitted => Some("READ COMMITTED"),
        TransactionLevel::DirtyRead => Some("READ UNCOMMITTED"),
    };
    if let Some(level) = level {
        sql.push_str("SET TRANSACTION ISOLATION LEVEL ");
        sql.push_str(level);
        sql.push_str("; ");
    }
    let _ = write!(
        sql,
        "SET LOCK_TIMEOUT {}; BEGIN TRANSACTION",
        params.effective_lock_time_out().as_millis()
    );
    sql
}

impl<'c> MssqlTransaction<'c> {
    pub(crate) fn new(conn: &'c MssqlConnection, params: TransactionParams) -> Self {
        Self {
            conn,
            params,
            tracker: TransactionTracker::new(),
        }
    }
}

impl Transaction for MssqlTransaction<'_> {
    type Stmt<'t>
        = MssqlStatement<'t>
    where
        Self: 't;

    fn start(&self) -> Result<(), DbLibError> {
        self.tracker.check_not_started()?;
        self.conn.batch_execute(&begin_sql(&self.params))?;
        self.tracker.set(TransactionState::Started);
        Ok(())
    }

    fn commit(&self) -> Result<(), DbLibError> {
        self.tracker.check_started()?;
        self.conn.batch_execute("COMMIT TRANSACTION")?;
        self.tracker.set(TransactionState::Committed);
        Ok(())
    }

    fn rollback(&self) -> Result<(), DbLibError> {
        self.tracker.check_started()?;
        self.conn.batch_execute("ROLLBACK TRANSACTION")?;
        self.tracker.set(TransactionState::RolledBack);
        Ok(())
    }

    fn state(&self) -> TransactionState {
        self.tracker.state()
    }

    fn params(&self) -> &TransactionParams {
        &self.params
    }

    fn create_statement(&self) -> MssqlStatement<'_> {
        MssqlStatement::new(self.conn)
    }
}

impl Drop for MssqlTransaction<'_> {
    fn drop(&mut self) {
        finish_on_drop(self);
        self.conn.release_transaction();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::types::LockResolution;

    #[test]
    fn begin_sets_level_and_lock_timeout() {
        let params = TransactionParams::default().with_lock_time_out(Duration::from_secs(2));
        assert_eq!(begin_sql(&params), "SET LOCK_TIMEOUT 2000; BEGIN TRANSACTION");

        let params = params
            .with_level(TransactionLevel::Serializable)
            .with_lock_resolution(LockResolution::NoWait);
        assert_eq!(
            begin_sql(&params),
            "SET TRANSACTION ISOLATION LEVEL SERIALIZABLE; SET LOCK_TIMEOUT 0; BEGIN TRANSACTION"
        );
    }
}
