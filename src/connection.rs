use serde::{Deserialize, Serialize};

use crate::error::DbLibError;
use crate::identifier::IndexOrName;
use crate::statement::{Statement, StatementState};
use crate::transaction::Transaction;
use crate::types::{
    DatabaseType, StatementType, TransactionParams, TransactionState, ValueType,
};
use crate::value::{Value, ValueKind};

#[cfg(feature = "mssql")]
use crate::mssql::{MssqlConnection, MssqlOptions, MssqlStatement, MssqlTransaction};
#[cfg(feature = "postgres")]
use crate::postgres::{PgStatement, PgTransaction, PostgresConnection, PostgresOptions};
#[cfg(feature = "sqlite")]
use crate::sqlite::{SqliteConnection, SqliteOptions, SqliteStatement, SqliteTransaction};

/// An open session to one database.
///
/// A connection runs at most one transaction at a time; the transaction borrows the connection
/// and statements borrow the transaction.
pub trait Connection {
    type Tx<'c>: Transaction
    where
        Self: 'c;

    fn db_type(&self) -> DatabaseType;

    /// Whether the backend has sequences, so `{if_seq}` renders the key column and `{next}` a
    /// sequence call. Without them keys are generated on insert and read back with
    /// [`Statement::last_row_id`].
    fn supports_sequences(&self) -> bool;

    /// Open a transaction, starting it when `params.autostart` is set.
    ///
    /// # Errors
    /// `Sequence` if a transaction is already open on this connection, or backend errors from
    /// starting it.
    fn open_transaction(&self, params: TransactionParams) -> Result<Self::Tx<'_>, DbLibError>;

    /// # Errors
    /// See [`Connection::open_transaction`].
    fn transaction(&self) -> Result<Self::Tx<'_>, DbLibError> {
        self.open_transaction(TransactionParams::default())
    }
}

/// Connection settings for any compiled-in backend, tagged by `db_type`.
///
/// ```rust
/// # #[cfg(feature = "sqlite")]
/// # {
/// use sql_dblib::connection::ConnectionConfig;
///
/// let config: ConnectionConfig =
///     serde_json::from_str(r#"{"db_type": "sqlite", "db_path": ":memory:"}"#).unwrap();
/// assert_eq!(config.db_type(), sql_dblib::prelude::DatabaseType::Sqlite);
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "db_type", rename_all = "lowercase")]
pub enum ConnectionConfig {
    #[cfg(feature = "postgres")]
    Postgres(PostgresOptions),
    #[cfg(feature = "sqlite")]
    Sqlite(SqliteOptions),
    #[cfg(feature = "mssql")]
    Mssql(MssqlOptions),
}

impl ConnectionConfig {
    #[must_use]
    pub fn db_type(&self) -> DatabaseType {
        match self {
            #[cfg(feature = "postgres")]
            ConnectionConfig::Postgres(_) => DatabaseType::Postgres,
            #[cfg(feature = "sqlite")]
            ConnectionConfig::Sqlite(_) => DatabaseType::Sqlite,
            #[cfg(feature = "mssql")]
            ConnectionConfig::Mssql(_) => DatabaseType::Mssql,
        }
    }
}

/// A connection to whichever backend a [`ConnectionConfig`] names.
#[derive(Debug)]
pub enum AnyConnection {
    #[cfg(feature = "postgres")]
    Postgres(PostgresConnection),
    #[cfg(feature = "sqlite")]
    Sqlite(SqliteConnection),
    #[cfg(feature = "mssql")]
    Mssql(MssqlConnection),
}

/// Transaction of an [`AnyConnection`].
pub enum AnyTransaction<'c> {
    #[cfg(feature = "postgres")]
    Postgres(PgTransaction<'c>),
    #[cfg(feature = "sqlite")]
    Sqlite(SqliteTransaction<'c>),
    #[cfg(feature = "mssql")]
    Mssql(MssqlTransaction<'c>),
}

/// Statement of an [`AnyTransaction`].
pub enum AnyStatement<'t> {
    #[cfg(feature = "postgres")]
    Postgres(PgStatement<'t>),
    #[cfg(feature = "sqlite")]
    Sqlite(SqliteStatement<'t>),
    #[cfg(feature = "mssql")]
    Mssql(MssqlStatement<'t>),
}

macro_rules! dispatch {
    ($enum:ident, $value:expr, $inner:ident => $body:expr) => {
        match $value {
            #[cfg(feature = "postgres")]
            $enum::Postgres($inner) => $body,
            #[cfg(feature = "sqlite")]
            $enum::Sqlite($inner) => $body,
            #[cfg(feature = "mssql")]
            $enum::Mssql($inner) => $body,
        }
    };
}

/// Like `dispatch!`, re-wrapping the result in the same variant of `$out`.
macro_rules! dispatch_wrap {
    ($enum:ident, $out:ident, $value:expr, $inner:ident => $body:expr) => {
        match $value {
            #[cfg(feature = "postgres")]
            $enum::Postgres($inner) => $out::Postgres($body),
            #[cfg(feature = "sqlite")]
            $enum::Sqlite($inner) => $out::Sqlite($body),
            #[cfg(feature = "mssql")]
            $enum::Mssql($inner) => $out::Mssql($body),
        }
    };
}

impl AnyConnection {
    /// # Errors
    /// `ConfigError` for incomplete options, `ConnectionError` or driver errors when the
    /// database cannot be opened.
    pub fn connect(config: &ConnectionConfig) -> Result<Self, DbLibError> {
        Ok(match config {
            #[cfg(feature = "postgres")]
            ConnectionConfig::Postgres(options) => AnyConnection::Postgres(options.connect()?),
            #[cfg(feature = "sqlite")]
            ConnectionConfig::Sqlite(options) => AnyConnection::Sqlite(options.connect()?),
            #[cfg(feature = "mssql")]
            ConnectionConfig::Mssql(options) => AnyConnection::Mssql(options.connect()?),
        })
    }
}

impl Connection for AnyConnection {
    type Tx<'c> = AnyTransaction<'c>;

    fn db_type(&self) -> DatabaseType {
        dispatch!(AnyConnection, self, c => c.db_type())
    }

    fn supports_sequences(&self) -> bool {
        dispatch!(AnyConnection, self, c => c.supports_sequences())
    }

    fn open_transaction(
        &self,
        params: TransactionParams,
    ) -> Result<AnyTransaction<'_>, DbLibError> {
        Ok(dispatch_wrap!(AnyConnection, AnyTransaction, self, c => c.open_transaction(params)?))
    }
}

impl Transaction for AnyTransaction<'_> {
    type Stmt<'t>
        = AnyStatement<'t>
    where
        Self: 't;

    fn start(&self) -> Result<(), DbLibError> {
        dispatch!(AnyTransaction, self, tx => tx.start())
    }

    fn commit(&self) -> Result<(), DbLibError> {
        dispatch!(AnyTransaction, self, tx => tx.commit())
    }

    fn rollback(&self) -> Result<(), DbLibError> {
        dispatch!(AnyTransaction, self, tx => tx.rollback())
    }

    fn state(&self) -> TransactionState {
        dispatch!(AnyTransaction, self, tx => tx.state())
    }

    fn params(&self) -> &TransactionParams {
        dispatch!(AnyTransaction, self, tx => tx.params())
    }

    fn create_statement(&self) -> AnyStatement<'_> {
        dispatch_wrap!(AnyTransaction, AnyStatement, self, tx => tx.create_statement())
    }
}

impl Statement for AnyStatement<'_> {
    fn prepare_with_syntax(
        &mut self,
        sql: &str,
        use_native_parameter_syntax: bool,
    ) -> Result<(), DbLibError> {
        dispatch!(AnyStatement, self, s => s.prepare_with_syntax(sql, use_native_parameter_syntax))
    }

    fn execute_prepared(&mut self) -> Result<(), DbLibError> {
        dispatch!(AnyStatement, self, s => s.execute_prepared())
    }

    fn execute(&mut self, sql: &str) -> Result<(), DbLibError> {
        dispatch!(AnyStatement, self, s => s.execute(sql))
    }

    fn fetch(&mut self) -> Result<bool, DbLibError> {
        dispatch!(AnyStatement, self, s => s.fetch())
    }

    fn rows_affected(&self) -> Result<u64, DbLibError> {
        dispatch!(AnyStatement, self, s => s.rows_affected())
    }

    fn state(&self) -> StatementState {
        dispatch!(AnyStatement, self, s => s.state())
    }

    fn last_sql(&self) -> Option<&str> {
        dispatch!(AnyStatement, self, s => s.last_sql())
    }

    fn statement_type(&self) -> Result<StatementType, DbLibError> {
        dispatch!(AnyStatement, self, s => s.statement_type())
    }

    fn last_row_id(&mut self) -> Result<i64, DbLibError> {
        dispatch!(AnyStatement, self, s => s.last_row_id())
    }

    fn params_count(&self) -> Result<usize, DbLibError> {
        dispatch!(AnyStatement, self, s => s.params_count())
    }

    fn param_type(&self, param: &IndexOrName) -> Result<ValueType, DbLibError> {
        dispatch!(AnyStatement, self, s => s.param_type(param))
    }

    fn columns_count(&self) -> Result<usize, DbLibError> {
        dispatch!(AnyStatement, self, s => s.columns_count())
    }

    fn column_name(&self, index: usize) -> Result<String, DbLibError> {
        dispatch!(AnyStatement, self, s => s.column_name(index))
    }

    fn column_type(&mut self, column: &IndexOrName) -> Result<ValueType, DbLibError> {
        dispatch!(AnyStatement, self, s => s.column_type(column))
    }

    fn set_value(&mut self, param: &IndexOrName, value: Option<&Value>) -> Result<(), DbLibError> {
        dispatch!(AnyStatement, self, s => s.set_value(param, value))
    }

    fn get_value(
        &mut self,
        column: &IndexOrName,
        kind: ValueKind,
    ) -> Result<Option<Value>, DbLibError> {
        dispatch!(AnyStatement, self, s => s.get_value(column, kind))
    }

    fn is_null(&mut self, column: &IndexOrName) -> Result<bool, DbLibError> {
        dispatch!(AnyStatement, self, s => s.is_null(column))
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use super::*;

    #[test]
    fn config_is_tagged_by_db_type() -> Result<(), Box<dyn std::error::Error>> {
        let config: ConnectionConfig =
            serde_json::from_str(r#"{"db_type":"sqlite","db_path":":memory:","wal":false}"#)?;
        assert_eq!(config.db_type(), DatabaseType::Sqlite);
        assert_eq!(
            serde_json::to_value(&config)?["db_type"],
            serde_json::json!("sqlite")
        );
        Ok(())
    }

    #[test]
    fn any_connection_runs_a_query() -> Result<(), Box<dyn std::error::Error>> {
        let conn = AnyConnection::connect(&ConnectionConfig::Sqlite(SqliteOptions::in_memory()))?;
        assert_eq!(conn.db_type(), DatabaseType::Sqlite);
        assert!(!conn.supports_sequences());

        let tx = conn.transaction()?;
        assert!(tx.started());
        let mut stmt = tx.create_statement();
        stmt.execute("select 40 + 2 as answer")?;
        assert!(stmt.fetch()?);
        assert_eq!(stmt.get_i32("answer")?, 42);
        assert!(!stmt.fetch()?);
        assert_eq!(stmt.last_sql(), Some("select 40 + 2 as answer"));
        assert_eq!(stmt.statement_type()?, StatementType::Select);
        drop(stmt);

        assert!(conn.transaction().is_err());
        tx.commit()?;
        Ok(())
    }
}
