use rusqlite::types::{Null, Value as SqlValue};
use tracing::{debug, trace};

use super::params::{
    SqliteActions, blob_from_sqlite, date_from_sqlite, date_to_sqlite, decl_type_to_value_type,
    sqlite_value_type, time_from_sqlite, time_to_sqlite, timestamp_from_sqlite,
    timestamp_to_sqlite,
};
use super::query::{Buffered, run_bound};
use crate::columns::ColumnsHelper;
use crate::conversion::{
    TypeConverterDataProvider, float_to, get_with_conversion, int_to, set_with_conversion,
};
use crate::error::DbLibError;
use crate::identifier::IndexOrName;
use crate::statement::{Statement, StatementState};
use crate::translation::SqlPreprocessor;
use crate::types::ValueType;
use crate::value::{Value, ValueKind};

/// Statement on a `SQLite` connection.
///
/// Placeholders go to `SQLite` unchanged and are resolved by its own parameter lookup. Rows are
/// read in full on execution and handed out by `fetch`.
pub struct SqliteStatement<'t> {
    conn: &'t rusqlite::Connection,
    stmt: Option<rusqlite::Statement<'t>>,
    preprocessor: SqlPreprocessor,
    last_sql: Option<String>,
    column_names: Vec<String>,
    decl_types: Vec<Option<String>>,
    columns: ColumnsHelper,
    rows: std::vec::IntoIter<Vec<SqlValue>>,
    current: Option<Vec<SqlValue>>,
    rows_affected: u64,
    state: StatementState,
}

impl<'t> SqliteStatement<'t> {
    pub(crate) fn new(conn: &'t rusqlite::Connection) -> Self {
        Self {
            conn,
            stmt: None,
            preprocessor: SqlPreprocessor::new(),
            last_sql: None,
            column_names: Vec::new(),
            decl_types: Vec::new(),
            columns: ColumnsHelper::new(),
            rows: Vec::new().into_iter(),
            current: None,
            rows_affected: 0,
            state: StatementState::Undefined,
        }
    }

    fn reset(&mut self) {
        self.stmt = None;
        self.column_names.clear();
        self.decl_types.clear();
        self.columns.clear();
        self.discard_rows();
        self.state = StatementState::Undefined;
    }

    fn discard_rows(&mut self) {
        self.rows = Vec::new().into_iter();
        self.current = None;
        self.rows_affected = 0;
    }

    fn compile(
        &mut self,
        sql: &str,
        use_native: bool,
    ) -> Result<rusqlite::Statement<'t>, DbLibError> {
        self.reset();
        self.last_sql = Some(sql.to_string());
        let native = self.preprocessor.preprocess(
            sql,
            use_native,
            SqliteActions::SUPPORTS_INDEXED_PARAM_COALESCING,
            &SqliteActions,
        );
        debug!(sql = %native, "sqlite prepare");
        let stmt = self.conn.prepare(&native)?;
        self.column_names = stmt
            .column_names()
            .iter()
            .map(std::string::ToString::to_string)
            .collect();
        self.decl_types = stmt
            .columns()
            .iter()
            .map(|c| c.decl_type().map(str::to_string))
            .collect();
        Ok(stmt)
    }

    fn accept(&mut self, buffered: Buffered) {
        self.rows = buffered.rows.into_iter();
        self.current = None;
        self.rows_affected = buffered.rows_affected;
        self.state = StatementState::Executed;
    }

    fn prepared_mut(&mut self) -> Result<&mut rusqlite::Statement<'t>, DbLibError> {
        self.stmt
            .as_mut()
            .ok_or_else(|| DbLibError::sequence("Statement is not prepared"))
    }

    /// 1-based native slot behind `param`.
    fn resolve_param(&self, param: &IndexOrName) -> Result<usize, DbLibError> {
        let stmt = self
            .stmt
            .as_ref()
            .ok_or_else(|| DbLibError::ParameterNotFound(param.to_string()))?;
        let index = match param {
            IndexOrName::Index(index) => *index,
            IndexOrName::Name(name) => match stmt.parameter_index(name)? {
                Some(index) => index,
                None => (1..=stmt.parameter_count())
                    .find(|&i| {
                        stmt.parameter_name(i)
                            .is_some_and(|candidate| candidate.eq_ignore_ascii_case(name))
                    })
                    .ok_or_else(|| DbLibError::ParameterNotFound(name.clone()))?,
            },
        };
        if index == 0 || index > stmt.parameter_count() {
            return Err(DbLibError::ParameterNotFound(param.to_string()));
        }
        Ok(index)
    }

    fn bind<T: rusqlite::ToSql>(&mut self, index: usize, value: T) -> Result<(), DbLibError> {
        self.prepared_mut()?.raw_bind_parameter(index, value)?;
        Ok(())
    }

    fn cell(&self, index: usize) -> Result<&SqlValue, DbLibError> {
        self.current
            .as_ref()
            .and_then(|row| row.get(index.wrapping_sub(1)))
            .ok_or_else(|| DbLibError::ColumnNotFound(index.to_string()))
    }

    fn current_cell(&mut self, column: &IndexOrName) -> Result<&SqlValue, DbLibError> {
        self.state.check_has_data()?;
        let index = self.columns.get_column_index(column, &self.column_names)?;
        self.cell(index)
    }
}

fn mismatch(value: &SqlValue, to: &str) -> DbLibError {
    DbLibError::type_conversion(sqlite_value_type(value), to)
}

impl TypeConverterDataProvider for SqliteStatement<'_> {
    fn set_i16_impl(&mut self, index: usize, value: i16) -> Result<(), DbLibError> {
        self.bind(index, value)
    }

    fn set_i32_impl(&mut self, index: usize, value: i32) -> Result<(), DbLibError> {
        self.bind(index, value)
    }

    fn set_i64_impl(&mut self, index: usize, value: i64) -> Result<(), DbLibError> {
        self.bind(index, value)
    }

    fn set_f32_impl(&mut self, index: usize, value: f32) -> Result<(), DbLibError> {
        self.bind(index, f64::from(value))
    }

    fn set_f64_impl(&mut self, index: usize, value: f64) -> Result<(), DbLibError> {
        self.bind(index, value)
    }

    fn set_str_impl(&mut self, index: usize, value: &str) -> Result<(), DbLibError> {
        self.bind(index, value)
    }

    fn get_i16_impl(&self, index: usize) -> Result<i16, DbLibError> {
        int_to(self.get_i64_impl(index)?)
    }

    fn get_i32_impl(&self, index: usize) -> Result<i32, DbLibError> {
        int_to(self.get_i64_impl(index)?)
    }

    fn get_i64_impl(&self, index: usize) -> Result<i64, DbLibError> {
        match self.cell(index)? {
            SqlValue::Integer(v) => Ok(*v),
            other => Err(mismatch(other, "int64")),
        }
    }

    fn get_f32_impl(&self, index: usize) -> Result<f32, DbLibError> {
        float_to(self.get_f64_impl(index)?)
    }

    fn get_f64_impl(&self, index: usize) -> Result<f64, DbLibError> {
        match self.cell(index)? {
            SqlValue::Real(v) => Ok(*v),
            other => Err(mismatch(other, "double")),
        }
    }

    fn get_str_impl(&self, index: usize) -> Result<String, DbLibError> {
        match self.cell(index)? {
            SqlValue::Text(v) => Ok(v.clone()),
            other => Err(mismatch(other, "utf8 string")),
        }
    }
}

impl Statement for SqliteStatement<'_> {
    fn prepare_with_syntax(
        &mut self,
        sql: &str,
        use_native_parameter_syntax: bool,
    ) -> Result<(), DbLibError> {
        let use_native = use_native_parameter_syntax || SqliteActions::USE_NATIVE_FOR_PREPARE;
        let stmt = self.compile(sql, use_native)?;
        self.stmt = Some(stmt);
        self.state = StatementState::Prepared;
        Ok(())
    }

    fn execute_prepared(&mut self) -> Result<(), DbLibError> {
        self.state.check_prepared()?;
        self.columns.clear();
        self.discard_rows();
        let buffered = run_bound(self.prepared_mut()?)?;
        trace!(rows = buffered.rows.len(), "sqlite execute");
        self.accept(buffered);
        Ok(())
    }

    fn execute(&mut self, sql: &str) -> Result<(), DbLibError> {
        let mut stmt = self.compile(sql, true)?;
        let buffered = run_bound(&mut stmt)?;
        self.accept(buffered);
        Ok(())
    }

    fn fetch(&mut self) -> Result<bool, DbLibError> {
        self.state.check_can_fetch()?;
        self.current = self.rows.next();
        let has_row = self.current.is_some();
        self.state = self.state.after_fetch(has_row);
        Ok(has_row)
    }

    fn rows_affected(&self) -> Result<u64, DbLibError> {
        self.state.check_executed()?;
        Ok(self.rows_affected)
    }

    fn state(&self) -> StatementState {
        self.state
    }

    fn last_sql(&self) -> Option<&str> {
        self.last_sql.as_deref()
    }

    fn last_row_id(&mut self) -> Result<i64, DbLibError> {
        self.state.check_executed()?;
        Ok(self.conn.last_insert_rowid())
    }

    fn params_count(&self) -> Result<usize, DbLibError> {
        self.state.check_prepared()?;
        Ok(self.stmt.as_ref().map_or(0, rusqlite::Statement::parameter_count))
    }

    fn param_type(&self, param: &IndexOrName) -> Result<ValueType, DbLibError> {
        self.state.check_prepared()?;
        self.resolve_param(param)?;
        Ok(ValueType::Any)
    }

    fn columns_count(&self) -> Result<usize, DbLibError> {
        self.state.check_prepared()?;
        Ok(self.column_names.len())
    }

    fn column_name(&self, index: usize) -> Result<String, DbLibError> {
        self.state.check_prepared()?;
        index
            .checked_sub(1)
            .and_then(|i| self.column_names.get(i))
            .cloned()
            .ok_or_else(|| DbLibError::ColumnNotFound(index.to_string()))
    }

    fn column_type(&mut self, column: &IndexOrName) -> Result<ValueType, DbLibError> {
        self.state.check_prepared()?;
        let index = self.columns.get_column_index(column, &self.column_names)?;
        if self.state == StatementState::Fetching
            && let Ok(cell) = self.cell(index)
            && !matches!(cell, SqlValue::Null)
        {
            return Ok(sqlite_value_type(cell));
        }
        let decl = index
            .checked_sub(1)
            .and_then(|i| self.decl_types.get(i))
            .and_then(Option::as_deref);
        Ok(decl_type_to_value_type(decl))
    }

    fn set_value(&mut self, param: &IndexOrName, value: Option<&Value>) -> Result<(), DbLibError> {
        self.state.check_prepared()?;
        self.prepared_mut()?;
        let index = self.resolve_param(param)?;
        trace!(%param, index, "sqlite bind");
        let Some(value) = value else {
            return self.bind(index, Null);
        };
        match value {
            Value::Date(d) => self.bind(index, date_to_sqlite(d)),
            Value::Time(t) => self.bind(index, time_to_sqlite(t)),
            Value::Timestamp(ts) => self.bind(index, timestamp_to_sqlite(ts)),
            Value::Blob(b) => self.bind(index, b.as_slice()),
            other => set_with_conversion(self, other.kind().natural_type(), index, other),
        }
    }

    fn get_value(
        &mut self,
        column: &IndexOrName,
        kind: ValueKind,
    ) -> Result<Option<Value>, DbLibError> {
        self.state.check_has_data()?;
        let index = self.columns.get_column_index(column, &self.column_names)?;
        let cell = self.cell(index)?;
        if matches!(cell, SqlValue::Null) {
            return Ok(None);
        }
        let value = match kind {
            ValueKind::Date => Value::Date(date_from_sqlite(cell)?),
            ValueKind::Time => Value::Time(time_from_sqlite(cell)?),
            ValueKind::Timestamp => Value::Timestamp(timestamp_from_sqlite(cell)?),
            ValueKind::Blob => Value::Blob(blob_from_sqlite(cell)?),
            _ => get_with_conversion(&*self, sqlite_value_type(cell), index, kind)?,
        };
        Ok(Some(value))
    }

    fn is_null(&mut self, column: &IndexOrName) -> Result<bool, DbLibError> {
        Ok(matches!(self.current_cell(column)?, SqlValue::Null))
    }
}
