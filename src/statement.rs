use crate::error::DbLibError;
use crate::identifier::IndexOrName;
use crate::types::{Date, StatementType, Time, Timestamp, ValueType};
use crate::value::{Value, ValueKind};

/// Where a statement is in its prepare/execute/fetch cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatementState {
    #[default]
    Undefined,
    Prepared,
    /// Executed, no row fetched yet.
    Executed,
    /// Positioned on a row.
    Fetching,
    /// Every row has been fetched.
    Exhausted,
}

impl StatementState {
    /// # Errors
    /// `DbLibError::Sequence` before the first prepare or execute.
    pub fn check_prepared(self) -> Result<(), DbLibError> {
        match self {
            StatementState::Undefined => Err(DbLibError::sequence("Statement is not prepared")),
            _ => Ok(()),
        }
    }

    /// # Errors
    /// `DbLibError::Sequence` unless the statement has been executed.
    pub fn check_executed(self) -> Result<(), DbLibError> {
        match self {
            StatementState::Executed | StatementState::Fetching | StatementState::Exhausted => {
                Ok(())
            }
            _ => Err(DbLibError::sequence("Statement is not executed")),
        }
    }

    /// # Errors
    /// `DbLibError::Sequence` unless positioned on a row.
    pub fn check_has_data(self) -> Result<(), DbLibError> {
        match self {
            StatementState::Fetching => Ok(()),
            _ => Err(DbLibError::sequence("Statement doesn't contain data")),
        }
    }

    /// # Errors
    /// `DbLibError::Sequence` before execution or once the rows are exhausted.
    pub fn check_can_fetch(self) -> Result<(), DbLibError> {
        match self {
            StatementState::Executed | StatementState::Fetching => Ok(()),
            StatementState::Exhausted => Err(DbLibError::sequence("Fetch after data end")),
            _ => Err(DbLibError::sequence("Statement is not executed")),
        }
    }

    #[must_use]
    pub fn after_fetch(self, has_row: bool) -> Self {
        if has_row {
            StatementState::Fetching
        } else {
            StatementState::Exhausted
        }
    }
}

/// Rust types that can be read out of a column.
pub trait ColumnValue: Sized {
    const KIND: ValueKind;

    /// # Errors
    /// `DbLibError::TypeConversion` when `value` is not of kind `KIND`.
    fn from_value(value: Value) -> Result<Self, DbLibError>;
}

macro_rules! impl_column_value {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl ColumnValue for $t {
                const KIND: ValueKind = ValueKind::$variant;

                fn from_value(value: Value) -> Result<Self, DbLibError> {
                    match value {
                        Value::$variant(v) => Ok(v),
                        other => Err(DbLibError::type_conversion(other.kind(), Self::KIND)),
                    }
                }
            }
        )*
    };
}

impl_column_value! {
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    f32 => Float,
    f64 => Double,
    String => Utf8,
    Vec<u16> => Utf16,
    Date => Date,
    Time => Time,
    Timestamp => Timestamp,
    Vec<u8> => Blob,
}

macro_rules! typed_accessors {
    ($(
        $set:ident, $set_opt:ident, $get:ident, $get_opt:ident, $get_or:ident:
        $set_ty:ty => $get_ty:ty;
    )*) => {
        $(
            /// # Errors
            /// See [`Statement::set_value`].
            fn $set<P: Into<IndexOrName>>(
                &mut self,
                param: P,
                value: $set_ty,
            ) -> Result<(), DbLibError> {
                self.set(param, value)
            }

            /// # Errors
            /// See [`Statement::set_value`].
            fn $set_opt<P: Into<IndexOrName>>(
                &mut self,
                param: P,
                value: Option<$set_ty>,
            ) -> Result<(), DbLibError> {
                self.set_opt(param, value)
            }

            /// # Errors
            /// See [`Statement::get`].
            fn $get<C: Into<IndexOrName>>(&mut self, column: C) -> Result<$get_ty, DbLibError> {
                self.get(column)
            }

            /// # Errors
            /// See [`Statement::get_value`].
            fn $get_opt<C: Into<IndexOrName>>(
                &mut self,
                column: C,
            ) -> Result<Option<$get_ty>, DbLibError> {
                self.get_opt(column)
            }

            /// # Errors
            /// See [`Statement::get_value`].
            fn $get_or<C: Into<IndexOrName>>(
                &mut self,
                column: C,
                default: $get_ty,
            ) -> Result<$get_ty, DbLibError> {
                self.get_or(column, default)
            }
        )*
    };
}

/// A statement bound to a transaction.
///
/// Parameters and columns are addressed by 1-based ordinal or by name (`:id`, `"name"`).
/// ```rust,no_run
/// # use sql_dblib::prelude::*;
/// # fn demo(stmt: &mut impl Statement) -> Result<(), DbLibError> {
/// stmt.prepare("select name from person where id = :id and age > :id - 100")?;
/// stmt.set_i32(":id", 42)?;
/// stmt.execute_prepared()?;
/// while stmt.fetch()? {
///     let name: String = stmt.get("name")?;
///     # let _ = name;
/// }
/// # Ok(())
/// # }
/// ```
pub trait Statement {
    /// Preprocess and compile `sql`; resets parameters, columns and rows.
    ///
    /// With `use_native_parameter_syntax` placeholders reach the backend as written and are
    /// addressed by native ordinal only.
    ///
    /// # Errors
    /// Backend compile errors.
    fn prepare_with_syntax(
        &mut self,
        sql: &str,
        use_native_parameter_syntax: bool,
    ) -> Result<(), DbLibError>;

    /// # Errors
    /// See [`Statement::prepare_with_syntax`].
    fn prepare(&mut self, sql: &str) -> Result<(), DbLibError> {
        self.prepare_with_syntax(sql, false)
    }

    /// # Errors
    /// `Sequence` if nothing is prepared, or backend execution errors.
    fn execute_prepared(&mut self) -> Result<(), DbLibError>;

    /// Run `sql` directly. Placeholders are passed to the backend as written.
    ///
    /// # Errors
    /// Backend errors.
    fn execute(&mut self, sql: &str) -> Result<(), DbLibError>;

    /// Advance to the next row; `false` once the rows are exhausted.
    ///
    /// # Errors
    /// `Sequence` before execution or after `false` has been returned.
    fn fetch(&mut self) -> Result<bool, DbLibError>;

    /// # Errors
    /// `Sequence` before execution.
    fn rows_affected(&self) -> Result<u64, DbLibError>;

    fn state(&self) -> StatementState;

    /// SQL of the last `prepare` or `execute` call, as the caller wrote it.
    fn last_sql(&self) -> Option<&str>;

    /// # Errors
    /// `Sequence` before prepare.
    fn statement_type(&self) -> Result<StatementType, DbLibError> {
        self.state().check_prepared()?;
        Ok(self.last_sql().map_or(StatementType::Unknown, StatementType::of_sql))
    }

    /// Key generated by the most recent insert on this session: the rowid on `SQLite`, `lastval()`
    /// on PostgreSQL, `@@IDENTITY` on SQL Server.
    ///
    /// # Errors
    /// `Sequence` before execution, or backend errors when the session has generated no key.
    fn last_row_id(&mut self) -> Result<i64, DbLibError>;

    /// # Errors
    /// `Sequence` before prepare.
    fn params_count(&self) -> Result<usize, DbLibError>;

    /// # Errors
    /// `Sequence` before prepare, `ParameterNotFound` for unknown parameters.
    fn param_type(&self, param: &IndexOrName) -> Result<ValueType, DbLibError>;

    /// # Errors
    /// `Sequence` before prepare.
    fn columns_count(&self) -> Result<usize, DbLibError>;

    /// # Errors
    /// `Sequence` before prepare, `ColumnNotFound` when out of range.
    fn column_name(&self, index: usize) -> Result<String, DbLibError>;

    /// # Errors
    /// `Sequence` before prepare, `ColumnNotFound` for unknown columns.
    fn column_type(&mut self, column: &IndexOrName) -> Result<ValueType, DbLibError>;

    /// Bind `value` (NULL for `None`) to every native slot behind `param`.
    ///
    /// # Errors
    /// `Sequence`, `ParameterNotFound`, or conversion errors. Slots bound before a failure keep
    /// their new value.
    fn set_value(&mut self, param: &IndexOrName, value: Option<&Value>) -> Result<(), DbLibError>;

    /// Read `column` of the current row as `kind`; `None` for NULL.
    ///
    /// # Errors
    /// `Sequence` when not on a row, `ColumnNotFound`, or conversion errors.
    fn get_value(
        &mut self,
        column: &IndexOrName,
        kind: ValueKind,
    ) -> Result<Option<Value>, DbLibError>;

    /// # Errors
    /// `Sequence` when not on a row, `ColumnNotFound`.
    fn is_null(&mut self, column: &IndexOrName) -> Result<bool, DbLibError>;

    /// # Errors
    /// See [`Statement::set_value`].
    fn set_null<P: Into<IndexOrName>>(&mut self, param: P) -> Result<(), DbLibError> {
        self.set_value(&param.into(), None)
    }

    /// # Errors
    /// See [`Statement::set_value`].
    fn set<P, V>(&mut self, param: P, value: V) -> Result<(), DbLibError>
    where
        P: Into<IndexOrName>,
        V: Into<Value>,
    {
        self.set_value(&param.into(), Some(&value.into()))
    }

    /// # Errors
    /// See [`Statement::set_value`].
    fn set_opt<P, V>(&mut self, param: P, value: Option<V>) -> Result<(), DbLibError>
    where
        P: Into<IndexOrName>,
        V: Into<Value>,
    {
        let value = value.map(Into::into);
        self.set_value(&param.into(), value.as_ref())
    }

    /// # Errors
    /// See [`Statement::get_value`].
    fn get_opt<T, C>(&mut self, column: C) -> Result<Option<T>, DbLibError>
    where
        T: ColumnValue,
        C: Into<IndexOrName>,
    {
        self.get_value(&column.into(), T::KIND)?
            .map(T::from_value)
            .transpose()
    }

    /// # Errors
    /// `ColumnValueIsNull` for NULL, otherwise see [`Statement::get_value`].
    fn get<T, C>(&mut self, column: C) -> Result<T, DbLibError>
    where
        T: ColumnValue,
        C: Into<IndexOrName>,
    {
        let column = column.into();
        self.get_opt(&column)?
            .ok_or_else(|| DbLibError::ColumnValueIsNull(column.to_string()))
    }

    /// # Errors
    /// See [`Statement::get_value`].
    fn get_or<T, C>(&mut self, column: C, default: T) -> Result<T, DbLibError>
    where
        T: ColumnValue,
        C: Into<IndexOrName>,
    {
        Ok(self.get_opt(column)?.unwrap_or(default))
    }

    typed_accessors! {
        set_i16, set_i16_opt, get_i16, get_i16_opt, get_i16_or: i16 => i16;
        set_i32, set_i32_opt, get_i32, get_i32_opt, get_i32_or: i32 => i32;
        set_i64, set_i64_opt, get_i64, get_i64_opt, get_i64_or: i64 => i64;
        set_f32, set_f32_opt, get_f32, get_f32_opt, get_f32_or: f32 => f32;
        set_f64, set_f64_opt, get_f64, get_f64_opt, get_f64_or: f64 => f64;
        set_str, set_str_opt, get_str, get_str_opt, get_str_or: &str => String;
        set_wstr, set_wstr_opt, get_wstr, get_wstr_opt, get_wstr_or: Vec<u16> => Vec<u16>;
        set_date, set_date_opt, get_date, get_date_opt, get_date_or: Date => Date;
        set_time, set_time_opt, get_time, get_time_opt, get_time_or: Time => Time;
        set_timestamp, set_timestamp_opt, get_timestamp, get_timestamp_opt, get_timestamp_or:
            Timestamp => Timestamp;
        set_blob, set_blob_opt, get_blob, get_blob_opt, get_blob_or: &[u8] => Vec<u8>;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequencing_rules() {
        let undefined = StatementState::Undefined;
        assert!(undefined.check_prepared().is_err());
        assert!(undefined.check_executed().is_err());
        assert!(undefined.check_can_fetch().is_err());

        assert!(StatementState::Prepared.check_prepared().is_ok());
        assert!(StatementState::Prepared.check_has_data().is_err());
        // column metadata on a server that only describes executed batches
        assert!(matches!(
            StatementState::Prepared.check_executed(),
            Err(DbLibError::Sequence(msg)) if msg == "Statement is not executed"
        ));

        let executed = StatementState::Executed;
        assert!(executed.check_can_fetch().is_ok());
        assert!(executed.check_has_data().is_err());
        assert_eq!(executed.after_fetch(true), StatementState::Fetching);
        assert!(StatementState::Fetching.check_has_data().is_ok());

        let done = StatementState::Fetching.after_fetch(false);
        assert_eq!(done, StatementState::Exhausted);
        assert!(matches!(
            done.check_can_fetch(),
            Err(DbLibError::Sequence(msg)) if msg == "Fetch after data end"
        ));
        assert!(done.check_executed().is_ok());
    }

    #[test]
    fn column_value_checks_kind() {
        assert_eq!(i32::from_value(Value::Int32(3)).ok(), Some(3));
        assert!(i32::from_value(Value::Int64(3)).is_err());
        assert_eq!(
            String::from_value(Value::Utf8("x".into())).ok(),
            Some("x".to_string())
        );
    }
}
