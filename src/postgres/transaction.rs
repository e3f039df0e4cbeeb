use super::connection::PostgresConnection;
use super::copy::PgCopyBuffer;
use super::statement::PgStatement;
use crate::error::DbLibError;
use crate::transaction::{Transaction, TransactionTracker, finish_on_drop};
use crate::types::{
    LockResolution, TransactionAccess, TransactionLevel, TransactionParams, TransactionState,
};

/// Transaction on a borrowed PostgreSQL session.
pub struct PgTransaction<'c> {
    conn: &'c PostgresConnection,
    params: TransactionParams,
    tracker: TransactionTracker,
}

/// `BEGIN` statement for `params`.
#[must_use]
pub fn begin_sql(params: &TransactionParams) -> String {
    let mut sql = String::from("BEGIN TRANSACTION");
    match params.level {
        TransactionLevel::Default => {}
        TransactionLevel::Serializable => sql.push_str(" ISOLATION LEVEL SERIALIZABLE"),
        TransactionLevel::RepeatableRead => sql.push_str(" ISOLATION LEVEL REPEATABLE READ"),
        TransactionLevel::ReadCommitted => sql.push_str(" ISOLATION LEVEL READ COMMITTED"),
        TransactionLevel::DirtyRead => sql.push_str(" ISOLATION LEVEL READ UNCOMMITTED"),
    }
    match params.access {
        TransactionAccess::Read => sql.push_str(" READ ONLY"),
        TransactionAccess::ReadWrite => sql.push_str(" READ WRITE"),
    }
    sql
}

/// `SET LOCAL lock_timeout` statement for `params`.
#[must_use]
pub fn lock_timeout_sql(params: &TransactionParams) -> String {
    match params.lock_resolution {
        LockResolution::NoWait => "SET LOCAL lock_timeout = '1ms'".to_string(),
        LockResolution::Wait => format!(
            "SET LOCAL lock_timeout = '{}s'",
            params.lock_time_out.as_secs()
        ),
    }
}

impl<'c> PgTransaction<'c> {
    pub(crate) fn new(conn: &'c PostgresConnection, params: TransactionParams) -> Self {
        Self {
            conn,
            params,
            tracker: TransactionTracker::new(),
        }
    }

    /// # Errors
    /// See [`PostgresConnection::copy_in`].
    pub fn copy_in(&self, sql: &str, buffer: &PgCopyBuffer) -> Result<u64, DbLibError> {
        self.tracker.check_started()?;
        self.conn.copy_in(sql, buffer)
    }
}

impl Transaction for PgTransaction<'_> {
    type Stmt<'t>
        = PgStatement<'t>
    where
        Self: 't;

    fn start(&self) -> Result<(), DbLibError> {
        self.tracker.check_not_started()?;
        self.conn.batch_execute(&begin_sql(&self.params))?;
        self.tracker.set(TransactionState::Started);
        if let Err(e) = self.conn.batch_execute(&lock_timeout_sql(&self.params)) {
            self.rollback()?;
            return Err(e);
        }
        Ok(())
    }

    fn commit(&self) -> Result<(), DbLibError> {
        self.tracker.check_started()?;
        self.conn.batch_execute("COMMIT")?;
        self.tracker.set(TransactionState::Committed);
        Ok(())
    }

    fn rollback(&self) -> Result<(), DbLibError> {
        self.tracker.check_started()?;
        self.conn.batch_execute("ROLLBACK")?;
        self.tracker.set(TransactionState::RolledBack);
        Ok(())
    }

    fn state(&self) -> TransactionState {
        self.tracker.state()
    }

    fn params(&self) -> &TransactionParams {
        &self.params
    }

    fn create_statement(&self) -> PgStatement<'_> {
        PgStatement::new(self.conn)
    }
}

impl Drop for PgTransaction<'_> {
    fn drop(&mut self) {
        finish_on_drop(self);
        self.conn.release_transaction();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn begin_follows_params() {
        assert_eq!(
            begin_sql(&TransactionParams::default()),
            "BEGIN TRANSACTION READ WRITE"
        );
        let params = TransactionParams::default()
            .with_level(TransactionLevel::RepeatableRead)
            .with_access(TransactionAccess::Read);
        assert_eq!(
            begin_sql(&params),
            "BEGIN TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY"
        );
    }

    #[test]
    fn lock_timeout_follows_resolution() {
        let params = TransactionParams::default().with_lock_time_out(Duration::from_secs(7));
        assert_eq!(lock_timeout_sql(&params), "SET LOCAL lock_timeout = '7s'");
        let params = params.with_lock_resolution(LockResolution::NoWait);
        assert_eq!(lock_timeout_sql(&params), "SET LOCAL lock_timeout = '1ms'");
    }
}
