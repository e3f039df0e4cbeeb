// PostgreSQL backend.
//
// - config: connection options and validation
// - connection: session plus the runtime that drives it
// - transaction: BEGIN/COMMIT/ROLLBACK with isolation and lock timeout
// - statement: preprocessing, binary binding and buffered fetch
// - params: placeholder rendering and binary value slots
// - codec: OIDs and the 2000-01-01 epoch
// - copy: binary COPY payloads

pub mod codec;
pub mod config;
pub mod connection;
pub mod copy;
pub mod params;
pub mod statement;
pub mod transaction;

pub use config::PostgresOptions;
pub use connection::PostgresConnection;
pub use copy::PgCopyBuffer;
pub use params::PgActions;
pub use statement::PgStatement;
pub use transaction::PgTransaction;
