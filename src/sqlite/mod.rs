// SQLite backend.
//
// - config: open options
// - connection: the database handle and its one-transaction-at-a-time rule
// - transaction: BEGIN/COMMIT/ROLLBACK on the borrowed connection
// - statement: preprocessing, binding and buffered fetch
// - params: placeholder rendering and value encodings
// - query: row extraction

pub mod config;
pub mod connection;
pub mod params;
mod query;
pub mod statement;
pub mod transaction;

pub use config::SqliteOptions;
pub use connection::SqliteConnection;
pub use params::SqliteActions;
pub use statement::SqliteStatement;
pub use transaction::SqliteTransaction;
