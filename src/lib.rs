//! Uniform statement access over SQLite, PostgreSQL and SQL Server.
//!
//! SQL is written once with `?N` ordinal and `:name` / `@name` / `$name` placeholders plus the
//! `{if_seq ...}` and `{next seq}` extensions. Each backend rewrites it into its own syntax, binds
//! values through a common conversion engine and exposes results through [`Statement`].
//!
//! ```rust,no_run
//! use sql_dblib::prelude::*;
//! use sql_dblib::sqlite::SqliteOptions;
//!
//! # fn main() -> Result<(), DbLibError> {
//! let conn = SqliteOptions::new("app.db").connect()?;
//! let tx = conn.transaction()?;
//! let mut stmt = tx.prepare("select name from person where id = :id")?;
//! stmt.set_i32(":id", 7)?;
//! stmt.execute_prepared()?;
//! while stmt.fetch()? {
//!     println!("{}", stmt.get_str("name")?);
//! }
//! # Ok(())
//! # }
//! ```

#[cfg(not(any(feature = "postgres", feature = "sqlite", feature = "mssql")))]
compile_error!("enable at least one of the `postgres`, `sqlite` or `mssql` features");

pub mod codec;
pub mod columns;
pub mod connection;
pub mod conversion;
pub mod error;
pub mod identifier;
pub mod prelude;
pub mod statement;
pub mod transaction;
pub mod translation;
pub mod types;
pub mod value;

#[cfg(feature = "mssql")]
pub mod mssql;
#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use connection::{AnyConnection, AnyStatement, AnyTransaction, Connection, ConnectionConfig};
pub use error::DbLibError;
pub use statement::Statement;
pub use transaction::Transaction;
