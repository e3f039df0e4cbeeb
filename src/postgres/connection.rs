use std::cell::Cell;
use std::fmt;
use std::future::Future;

use futures_util::SinkExt;
use tokio::runtime::Runtime;
use tokio_postgres::{Client, NoTls};
use tokio_util::bytes::Bytes;
use tracing::{debug, info, warn};

use super::config::PostgresOptions;
use super::copy::PgCopyBuffer;
use super::transaction::PgTransaction;
use crate::connection::Connection;
use crate::error::DbLibError;
use crate::transaction::Transaction;
use crate::types::{DatabaseType, TransactionParams};

/// A PostgreSQL session driven synchronously on a private current-thread runtime.
///
/// Calling into it from inside another tokio runtime panics, as any nested `block_on` does.
pub struct PostgresConnection {
    runtime: Runtime,
    pub(crate) client: Client,
    in_transaction: Cell<bool>,
}

impl PostgresConnection {
    /// # Errors
    /// `ConfigError` for incomplete options, `ConnectionError` if the server is unreachable.
    pub fn connect(options: &PostgresOptions) -> Result<Self, DbLibError> {
        let config = options.to_pg_config()?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| DbLibError::ConnectionError(format!("Failed to build runtime: {e}")))?;

        let (client, connection) = runtime
            .block_on(config.connect(NoTls))
            .map_err(|e| {
                DbLibError::ConnectionError(format!("Failed to connect to Postgres: {e}"))
            })?;
        runtime.spawn(async move {
            if let Err(e) = connection.await {
                warn!(error = %e, "postgres connection closed with error");
            }
        });
        info!(host = ?options.host, dbname = ?options.dbname, "postgres connected");

        Ok(Self {
            runtime,
            client,
            in_transaction: Cell::new(false),
        })
    }

    pub(crate) fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    pub(crate) fn batch_execute(&self, sql: &str) -> Result<(), DbLibError> {
        debug!(sql, "postgres batch");
        self.block_on(self.client.batch_execute(sql))?;
        Ok(())
    }

    /// Stream a binary COPY payload into `COPY ... FROM STDIN (FORMAT binary)`.
    ///
    /// # Errors
    /// Driver errors from the copy protocol.
    pub fn copy_in(&self, sql: &str, buffer: &PgCopyBuffer) -> Result<u64, DbLibError> {
        debug!(sql, rows = buffer.rows(), "postgres copy in");
        self.block_on(async {
            let sink = self.client.copy_in::<_, Bytes>(sql).await?;
            futures_util::pin_mut!(sink);
            sink.send(Bytes::from(buffer.as_bytes())).await?;
            let rows = sink.as_mut().finish().await?;
            Ok::<u64, DbLibError>(rows)
        })
    }

    pub(crate) fn release_transaction(&self) {
        self.in_transaction.set(false);
    }
}

impl Connection for PostgresConnection {
    type Tx<'c> = PgTransaction<'c>;

    fn db_type(&self) -> DatabaseType {
        DatabaseType::Postgres
    }

    fn supports_sequences(&self) -> bool {
        true
    }

    fn open_transaction(&self, params: TransactionParams) -> Result<PgTransaction<'_>, DbLibError> {
        if self.in_transaction.get() {
            return Err(DbLibError::sequence(
                "Connection already has an active transaction",
            ));
        }
        self.in_transaction.set(true);
        let tx = PgTransaction::new(self, params);
        if tx.params().autostart {
            tx.start()?;
        }
        Ok(tx)
    }
}

impl fmt::Debug for PostgresConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresConnection")
            .field("closed", &self.client.is_closed())
            .field("in_transaction", &self.in_transaction.get())
            .finish_non_exhaustive()
    }
}
