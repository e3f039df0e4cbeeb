use rusqlite::Statement;
use rusqlite::types::Value;

use crate::error::DbLibError;

/// Rows of one execution, fully read out of the statement.
#[derive(Debug, Default)]
pub(crate) struct Buffered {
    pub rows: Vec<Vec<Value>>,
    pub rows_affected: u64,
}

/// Run an already bound statement.
///
/// Statements without result columns are executed for their change count; anything else is
/// read to the end so the statement can be reset and rebound.
pub(crate) fn run_bound(stmt: &mut Statement<'_>) -> Result<Buffered, DbLibError> {
    let col_count = stmt.column_count();
    if col_count == 0 {
        let changed = stmt.raw_execute()?;
        return Ok(Buffered {
            rows: Vec::new(),
            rows_affected: changed as u64,
        });
    }

    let mut rows_iter = stmt.raw_query();
    let mut rows = Vec::new();
    while let Some(row) = rows_iter.next()? {
        let mut row_values = Vec::with_capacity(col_count);
        for i in 0..col_count {
            row_values.push(row.get::<_, Value>(i)?);
        }
        rows.push(row_values);
    }
    Ok(Buffered {
        rows,
        rows_affected: 0,
    })
}
