use futures_util::TryStreamExt;
use tiberius::{ColumnType, ToSql};
use tracing::{debug, trace};

use super::connection::MssqlConnection;
use super::params::{
    MssqlActions, MssqlValues, column_type_to_value_type, is_null, mssql_value_type,
};
use crate::columns::ColumnsHelper;
use crate::error::DbLibError;
use crate::identifier::IndexOrName;
use crate::statement::{Statement, StatementState};
use crate::translation::SqlPreprocessor;
use crate::types::ValueType;
use crate::value::{Value, ValueKind};

/// Statement on a SQL Server session.
///
/// TDS has no separate prepare step: `prepare` only rewrites placeholders to `@P<n>`, values are
/// sent with their own native types at execution, and result columns are known once the
/// statement has run. Column metadata is therefore a `Sequence` error until then.
pub struct MssqlStatement<'t> {
    conn: &'t MssqlConnection,
    sql: Option<String>,
    last_sql: Option<String>,
    preprocessor: SqlPreprocessor,
    params: MssqlValues,
    column_names: Vec<String>,
    column_types: Vec<ColumnType>,
    columns: ColumnsHelper,
    rows: std::vec::IntoIter<MssqlValues>,
    current: Option<MssqlValues>,
    rows_affected: u64,
    state: StatementState,
}

struct Fetched {
    column_names: Vec<String>,
    column_types: Vec<ColumnType>,
    rows: Vec<MssqlValues>,
}

impl<'t> MssqlStatement<'t> {
    pub(crate) fn new(conn: &'t MssqlConnection) -> Self {
        Self {
            conn,
            sql: None,
            last_sql: None,
            preprocessor: SqlPreprocessor::new(),
            params: MssqlValues::default(),
            column_names: Vec::new(),
            column_types: Vec::new(),
            columns: ColumnsHelper::new(),
            rows: Vec::new().into_iter(),
            current: None,
            rows_affected: 0,
            state: StatementState::Undefined,
        }
    }

    fn compile(&mut self, sql: &str, use_native: bool) -> String {
        self.sql = None;
        self.last_sql = Some(sql.to_string());
        self.columns.clear();
        self.column_names.clear();
        self.column_types.clear();
        self.rows = Vec::new().into_iter();
        self.current = None;
        self.rows_affected = 0;
        self.state = StatementState::Undefined;

        let native = self.preprocessor.preprocess(
            sql,
            use_native,
            MssqlActions::SUPPORTS_INDEXED_PARAM_COALESCING,
            &MssqlActions,
        );
        debug!(sql = %native, "mssql prepare");
        self.params = MssqlValues::with_len(self.preprocessor.params().native_count());
        native
    }

    fn run(&mut self, sql: &str) -> Result<(), DbLibError> {
        let params = self.params.params();
        let refs: Vec<&dyn ToSql> = params.iter().map(|p| p as &dyn ToSql).collect();

        let fetched = {
            let mut client = self.conn.client()?;
            self.conn.block_on(async {
                let mut stream = if refs.is_empty() {
                    client.simple_query(sql).await?
                } else {
                    client.query(sql, &refs).await?
                };
                let (column_names, column_types) = match stream.columns().await? {
                    Some(columns) => (
                        columns.iter().map(|c| c.name().to_string()).collect(),
                        columns.iter().map(tiberius::Column::column_type).collect(),
                    ),
                    None => (Vec::new(), Vec::new()),
                };
                let mut rows = Vec::new();
                let mut row_stream = stream.into_row_stream();
                while let Some(row) = row_stream.try_next().await? {
                    rows.push(MssqlValues::from_cells(row.into_iter().collect()));
                }
                Ok::<Fetched, DbLibError>(Fetched {
                    column_names,
                    column_types,
                    rows,
                })
            })?
        };

        let rows_affected = if fetched.column_names.is_empty() {
            self.last_row_count()?
        } else {
            fetched.rows.len() as u64
        };
        trace!(rows_affected, "mssql execute");

        self.column_names = fetched.column_names;
        self.column_types = fetched.column_types;
        self.columns.clear();
        self.rows = fetched.rows.into_iter();
        self.current = None;
        self.rows_affected = rows_affected;
        self.state = StatementState::Executed;
        Ok(())
    }

    /// `@@ROWCOUNT` of the statement that just ran on this session.
    fn last_row_count(&self) -> Result<u64, DbLibError> {
        let count: Option<i32> = self.session_scalar("SELECT @@ROWCOUNT")?;
        Ok(count.and_then(|c| u64::try_from(c).ok()).unwrap_or_default())
    }

    /// First column of the single row `sql` returns; `None` for no row or NULL.
    fn session_scalar<T>(&self, sql: &str) -> Result<Option<T>, DbLibError>
    where
        T: for<'a> tiberius::FromSql<'a>,
    {
        let mut client = self.conn.client()?;
        self.conn.block_on(async {
            let row = client.simple_query(sql).await?.into_row().await?;
            match row {
                Some(row) => Ok::<Option<T>, DbLibError>(row.try_get::<T, _>(0)?),
                None => Ok(None),
            }
        })
    }

    fn slots(&self, param: &IndexOrName) -> Result<Vec<usize>, DbLibError> {
        let mut slots = Vec::new();
        self.preprocessor.do_for_param_indexes(param, |slot| {
            slots.push(slot);
            Ok(())
        })?;
        Ok(slots)
    }

    fn current_index(&mut self, column: &IndexOrName) -> Result<usize, DbLibError> {
        self.state.check_has_data()?;
        self.columns.get_column_index(column, &self.column_names)
    }

    fn current_row(&self) -> Result<&MssqlValues, DbLibError> {
        self.current
            .as_ref()
            .ok_or_else(|| DbLibError::sequence("Statement doesn't contain data"))
    }
}

impl Statement for MssqlStatement<'_> {
    fn prepare_with_syntax(
        &mut self,
        sql: &str,
        use_native_parameter_syntax: bool,
    ) -> Result<(), DbLibError> {
        let use_native = use_native_parameter_syntax || MssqlActions::USE_NATIVE_FOR_PREPARE;
        let native = self.compile(sql, use_native);
        self.sql = Some(native);
        self.state = StatementState::Prepared;
        Ok(())
    }

    fn execute_prepared(&mut self) -> Result<(), DbLibError> {
        self.state.check_prepared()?;
        let sql = self
            .sql
            .clone()
            .ok_or_else(|| DbLibError::sequence("Statement is not prepared"))?;
        self.run(&sql)
    }

    fn execute(&mut self, sql: &str) -> Result<(), DbLibError> {
        let native = self.compile(sql, true);
        self.run(&native)
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
        // SCOPE_IDENTITY() is per batch and the insert ran in an earlier one
        let id: Option<i64> = self.session_scalar("SELECT CAST(@@IDENTITY AS BIGINT)")?;
        id.ok_or_else(|| {
            DbLibError::ExecutionError("no identity value was generated on this session".into())
        })
    }

    fn params_count(&self) -> Result<usize, DbLibError> {
        self.state.check_prepared()?;
        Ok(self.preprocessor.params().len())
    }

    fn param_type(&self, param: &IndexOrName) -> Result<ValueType, DbLibError> {
        self.state.check_prepared()?;
        if self.slots(param)?.is_empty() {
            return Err(DbLibError::ParameterNotFound(param.to_string()));
        }
        Ok(ValueType::Any)
    }

    fn columns_count(&self) -> Result<usize, DbLibError> {
        self.state.check_executed()?;
        Ok(self.column_names.len())
    }

    fn column_name(&self, index: usize) -> Result<String, DbLibError> {
        self.state.check_executed()?;
        index
            .checked_sub(1)
            .and_then(|i| self.column_names.get(i))
            .cloned()
            .ok_or_else(|| DbLibError::ColumnNotFound(index.to_string()))
    }

    fn column_type(&mut self, column: &IndexOrName) -> Result<ValueType, DbLibError> {
        self.state.check_executed()?;
        let index = self.columns.get_column_index(column, &self.column_names)?;
        if let Some(row) = &self.current
            && let Ok(cell) = row.cell(index)
            && !is_null(cell)
        {
            return Ok(mssql_value_type(cell));
        }
        index
            .checked_sub(1)
            .and_then(|i| self.column_types.get(i))
            .map(|ty| column_type_to_value_type(*ty))
            .ok_or_else(|| DbLibError::ColumnNotFound(column.to_string()))
    }

    fn set_value(&mut self, param: &IndexOrName, value: Option<&Value>) -> Result<(), DbLibError> {
        self.state.check_prepared()?;
        if self.sql.is_none() {
            return Err(DbLibError::sequence("Statement is not prepared"));
        }
        for slot in self.slots(param)? {
            trace!(%param, slot, "mssql bind");
            self.params.bind(slot, value)?;
        }
        Ok(())
    }

    fn get_value(
        &mut self,
        column: &IndexOrName,
        kind: ValueKind,
    ) -> Result<Option<Value>, DbLibError> {
        let index = self.current_index(column)?;
        let row = self.current_row()?;
        if is_null(row.cell(index)?) {
            return Ok(None);
        }
        row.decode(index, kind).map(Some)
    }

    fn is_null(&mut self, column: &IndexOrName) -> Result<bool, DbLibError> {
        let index = self.current_index(column)?;
        Ok(is_null(self.current_row()?.cell(index)?))
    }
}
