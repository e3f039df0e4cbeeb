use std::cell::{Cell, RefCell, RefMut};
use std::fmt;
use std::future::Future;

use tokio::runtime::Runtime;
use tracing::{debug, info};

use super::client::{MssqlClient, create_mssql_client};
use super::config::MssqlOptions;
use super::transaction::MssqlTransaction;
use crate::connection::Connection;
use crate::error::DbLibError;
use crate::transaction::Transaction;
use crate::types::{DatabaseType, TransactionParams};

/// A SQL Server session driven synchronously on a private current-thread runtime.
pub struct MssqlConnection {
    runtime: Runtime,
    client: RefCell<MssqlClient>,
    in_transaction: Cell<bool>,
}

impl MssqlConnection {
    /// # Errors
    /// `ConnectionError` if the server cannot be reached or rejects the login.
    pub fn connect(options: &MssqlOptions) -> Result<Self, DbLibError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| DbLibError::ConnectionError(format!("Failed to build runtime: {e}")))?;
        let client = runtime.block_on(create_mssql_client(options))?;
        info!(server = %options.server, database = %options.database, "mssql connected");

        Ok(Self {
            runtime,
            client: RefCell::new(client),
            in_transaction: Cell::new(false),
        })
    }

    pub(crate) fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    pub(crate) fn client(&self) -> Result<RefMut<'_, MssqlClient>, DbLibError> {
        self.client
            .try_borrow_mut()
            .map_err(|_| DbLibError::sequence("SQL Server session is busy"))
    }

    /// Run `sql` as a plain batch, discarding any rows.
    pub(crate) fn batch_execute(&self, sql: &str) -> Result<(), DbLibError> {
        debug!(sql, "mssql batch");
        let mut client = self.client()?;
        self.block_on(async {
            client.simple_query(sql).await?.into_results().await?;
            Ok::<(), DbLibError>(())
        })
    }

    pub(crate) fn release_transaction(&self) {
        self.in_transaction.set(false);
    }
}

impl Connection for MssqlConnection {
    type Tx<'c> = MssqlTransaction<'c>;

    fn db_type(&self) -> DatabaseType {
        DatabaseType::Mssql
    }

    fn supports_sequences(&self) -> bool {
        true
    }

    fn open_transaction(
        &self,
        params: TransactionParams,
    ) -> Result<MssqlTransaction<'_>, DbLibError> {
        if self.in_transaction.get() {
            return Err(DbLibError::sequence(
                "Connection already has an active transaction",
            ));
        }
        self.in_transaction.set(true);
        let tx = MssqlTransaction::new(self, params);
        if tx.params().autostart {
            tx.start()?;
        }
        Ok(tx)
    }
}

impl fmt::Debug for MssqlConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MssqlConnection")
            .field("in_transaction", &self.in_transaction.get())
            .finish_non_exhaustive()
    }
}
