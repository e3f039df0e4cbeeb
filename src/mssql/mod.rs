// SQL Server backend over TDS.
//
// - config: connection options
// - client: TCP + login
// - connection: session plus the runtime that drives it
// - transaction: isolation, lock timeout and BEGIN/COMMIT/ROLLBACK batches
// - statement: `@P<n>` rewriting, deferred binding and buffered fetch
// - params: placeholder rendering and value slots
// - codec: date and time wire forms

pub mod client;
pub mod codec;
pub mod config;
pub mod connection;
pub mod params;
pub mod statement;
pub mod transaction;

pub use client::{MssqlClient, create_mssql_client};
pub use config::MssqlOptions;
pub use connection::MssqlConnection;
pub use params::MssqlActions;
pub use statement::MssqlStatement;
pub use transaction::MssqlTransaction;
