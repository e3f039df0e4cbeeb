//! Convenient imports for common functionality.

pub use crate::connection::{
    AnyConnection, AnyStatement, AnyTransaction, Connection, ConnectionConfig,
};
pub use crate::error::DbLibError;
pub use crate::identifier::IndexOrName;
pub use crate::statement::{ColumnValue, Statement, StatementState};
pub use crate::transaction::Transaction;
pub use crate::translation::{SqlPreprocessor, SqlPreprocessorActions, preprocess};
pub use crate::types::{
    DatabaseType, Date, LockResolution, StatementType, Time, Timestamp, TransactionAccess,
    TransactionLevel, TransactionParams, TransactionState, ValueType,
};
pub use crate::value::{Value, ValueKind};
