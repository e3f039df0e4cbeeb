use tokio_postgres::types::ToSql;
use tracing::{debug, trace};

use super::codec::value_type_from_oid;
use super::connection::PostgresConnection;
use super::params::{PgActions, PgRaw, PgValues};
use crate::columns::ColumnsHelper;
use crate::error::DbLibError;
use crate::identifier::IndexOrName;
use crate::statement::{Statement, StatementState};
use crate::translation::SqlPreprocessor;
use crate::types::ValueType;
use crate::value::{Value, ValueKind};

/// Statement on a PostgreSQL session.
///
/// Parameters are encoded to binary against the types the server reports at prepare time and
/// results are decoded from binary against the reported column types.
pub struct PgStatement<'t> {
    conn: &'t PostgresConnection,
    prepared: Option<tokio_postgres::Statement>,
    preprocessor: SqlPreprocessor,
    last_sql: Option<String>,
    param_types: Vec<ValueType>,
    params: PgValues,
    column_names: Vec<String>,
    column_types: Vec<ValueType>,
    columns: ColumnsHelper,
    rows: std::vec::IntoIter<PgValues>,
    current: Option<PgValues>,
    rows_affected: u64,
    state: StatementState,
}

impl<'t> PgStatement<'t> {
    pub(crate) fn new(conn: &'t PostgresConnection) -> Self {
        Self {
            conn,
            prepared: None,
            preprocessor: SqlPreprocessor::new(),
            last_sql: None,
            param_types: Vec::new(),
            params: PgValues::default(),
            column_names: Vec::new(),
            column_types: Vec::new(),
            columns: ColumnsHelper::new(),
            rows: Vec::new().into_iter(),
            current: None,
            rows_affected: 0,
            state: StatementState::Undefined,
        }
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
    ) -> Result<tokio_postgres::Statement, DbLibError> {
        self.prepared = None;
        self.last_sql = Some(sql.to_string());
        self.columns.clear();
        self.discard_rows();
        self.state = StatementState::Undefined;

        let native = self.preprocessor.preprocess(
            sql,
            use_native,
            PgActions::SUPPORTS_INDEXED_PARAM_COALESCING,
            &PgActions,
        );
        debug!(sql = %native, "postgres prepare");
        let stmt = self.conn.block_on(self.conn.client.prepare(&native))?;

        self.param_types = stmt
            .params()
            .iter()
            .map(|ty| value_type_from_oid(ty.oid()))
            .collect();
        self.params = PgValues::with_len(stmt.params().len());
        self.column_names = stmt.columns().iter().map(|c| c.name().to_string()).collect();
        self.column_types = stmt
            .columns()
            .iter()
            .map(|c| value_type_from_oid(c.type_().oid()))
            .collect();
        Ok(stmt)
    }

    fn run(&mut self, stmt: &tokio_postgres::Statement) -> Result<(), DbLibError> {
        let raw = self.params.raw_params();
        let refs: Vec<&(dyn ToSql + Sync)> =
            raw.iter().map(|p| p as &(dyn ToSql + Sync)).collect();

        let (rows, rows_affected) = if stmt.columns().is_empty() {
            let affected = self.conn.block_on(self.conn.client.execute(stmt, &refs))?;
            (Vec::new(), affected)
        } else {
            let fetched = self.conn.block_on(self.conn.client.query(stmt, &refs))?;
            let mut rows = Vec::with_capacity(fetched.len());
            for row in &fetched {
                let mut cells = Vec::with_capacity(row.len());
                for i in 0..row.len() {
                    let cell: Option<PgRaw> = row.try_get(i)?;
                    cells.push(cell.map(|c| c.0));
                }
                rows.push(PgValues::from_cells(cells));
            }
            let count = rows.len() as u64;
            (rows, count)
        };
        trace!(rows_affected, "postgres execute");

        self.rows = rows.into_iter();
        self.current = None;
        self.rows_affected = rows_affected;
        self.state = StatementState::Executed;
        Ok(())
    }

    fn slots(&self, param: &IndexOrName) -> Result<Vec<usize>, DbLibError> {
        let mut slots = Vec::new();
        self.preprocessor.do_for_param_indexes(param, |slot| {
            slots.push(slot);
            Ok(())
        })?;
        Ok(slots)
    }

    fn param_type_at(&self, param: &IndexOrName, slot: usize) -> Result<ValueType, DbLibError> {
        slot.checked_sub(1)
            .and_then(|i| self.param_types.get(i))
            .copied()
            .ok_or_else(|| DbLibError::ParameterNotFound(param.to_string()))
    }

    fn current_index(&mut self, column: &IndexOrName) -> Result<usize, DbLibError> {
        self.state.check_has_data()?;
        self.columns.get_column_index(column, &self.column_names)
    }

    fn current_row(&self) -> Result<&PgValues, DbLibError> {
        self.current
            .as_ref()
            .ok_or_else(|| DbLibError::sequence("Statement doesn't contain data"))
    }
}

impl Statement for PgStatement<'_> {
    fn prepare_with_syntax(
        &mut self,
        sql: &str,
        use_native_parameter_syntax: bool,
    ) -> Result<(), DbLibError> {
        let use_native = use_native_parameter_syntax || PgActions::USE_NATIVE_FOR_PREPARE;
        let stmt = self.compile(sql, use_native)?;
        self.prepared = Some(stmt);
        self.state = StatementState::Prepared;
        Ok(())
    }

    fn execute_prepared(&mut self) -> Result<(), DbLibError> {
        self.state.check_prepared()?;
        let stmt = self
            .prepared
            .clone()
            .ok_or_else(|| DbLibError::sequence("Statement is not prepared"))?;
        self.columns.clear();
        self.discard_rows();
        self.run(&stmt)
    }

    fn execute(&mut self, sql: &str) -> Result<(), DbLibError> {
        let stmt = self.compile(sql, true)?;
        self.run(&stmt)
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
        let row = self
            .conn
            .block_on(self.conn.client.query_one("SELECT lastval()", &[]))?;
        Ok(row.try_get::<_, i64>(0)?)
    }

    fn params_count(&self) -> Result<usize, DbLibError> {
        self.state.check_prepared()?;
        if self.preprocessor.is_pass_through() {
            Ok(self.param_types.len())
        } else {
            Ok(self.preprocessor.params().len())
        }
    }

    fn param_type(&self, param: &IndexOrName) -> Result<ValueType, DbLibError> {
        self.state.check_prepared()?;
        let slot = self
            .slots(param)?
            .first()
            .copied()
            .ok_or_else(|| DbLibError::ParameterNotFound(param.to_string()))?;
        self.param_type_at(param, slot)
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
        index
            .checked_sub(1)
            .and_then(|i| self.column_types.get(i))
            .copied()
            .ok_or_else(|| DbLibError::ColumnNotFound(column.to_string()))
    }

    fn set_value(&mut self, param: &IndexOrName, value: Option<&Value>) -> Result<(), DbLibError> {
        self.state.check_prepared()?;
        if self.prepared.is_none() {
            return Err(DbLibError::sequence("Statement is not prepared"));
        }
        for slot in self.slots(param)? {
            let target = self.param_type_at(param, slot)?;
            trace!(%param, slot, %target, "postgres bind");
            self.params.bind(slot, target, value)?;
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
        if row.raw(index)?.is_none() {
            return Ok(None);
        }
        let source = index
            .checked_sub(1)
            .and_then(|i| self.column_types.get(i))
            .copied()
            .unwrap_or(ValueType::Any);
        row.decode(source, index, kind).map(Some)
    }

    fn is_null(&mut self, column: &IndexOrName) -> Result<bool, DbLibError> {
        let index = self.current_index(column)?;
        Ok(self.current_row()?.raw(index)?.is_none())
    }
}
