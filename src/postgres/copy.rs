use crate::codec::write_value_into_bytes_be;
use crate::error::DbLibError;
use crate::types::ValueType;
use crate::value::Value;

use super::params::encode_for_type;

const SIGNATURE: &[u8; 11] = b"PGCOPY\n\xff\r\n\0";

/// Payload for `COPY <table> (<columns>) FROM STDIN (FORMAT binary)`.
///
/// Each column is declared with the type of its target so values go through the same
/// conversions as statement parameters.
/// ```rust
/// # use sql_dblib::postgres::PgCopyBuffer;
/// # use sql_dblib::prelude::*;
/// let mut buffer = PgCopyBuffer::new(vec![ValueType::Integer, ValueType::Varchar]);
/// buffer.push_row(&[Some(Value::Int64(1)), Some(Value::from("one"))])?;
/// buffer.push_row(&[Some(Value::Int64(2)), None])?;
/// assert_eq!(buffer.rows(), 2);
/// # Ok::<(), DbLibError>(())
/// ```
#[derive(Debug, Clone)]
pub struct PgCopyBuffer {
    column_types: Vec<ValueType>,
    body: Vec<u8>,
    rows: usize,
}

impl PgCopyBuffer {
    #[must_use]
    pub fn new(column_types: Vec<ValueType>) -> Self {
        let mut body = Vec::with_capacity(64);
        body.extend_from_slice(SIGNATURE);
        write_value_into_bytes_be(0i32, &mut body);
        write_value_into_bytes_be(0i32, &mut body);
        Self {
            column_types,
            body,
            rows: 0,
        }
    }

    /// Append one tuple; `None` is NULL.
    ///
    /// # Errors
    /// `Other` when the row width differs from the declared columns, or any conversion error.
    /// A failed row leaves the buffer unchanged.
    pub fn push_row(&mut self, row: &[Option<Value>]) -> Result<(), DbLibError> {
        if row.len() != self.column_types.len() {
            return Err(DbLibError::Other(format!(
                "Copy row has {} values, expected {}",
                row.len(),
                self.column_types.len()
            )));
        }
        let field_count = i16::try_from(row.len())
            .map_err(|_| DbLibError::Other("Too many columns for COPY".to_string()))?;

        let mut tuple = Vec::new();
        write_value_into_bytes_be(field_count, &mut tuple);
        for (value, target) in row.iter().zip(&self.column_types) {
            match value {
                None => write_value_into_bytes_be(-1i32, &mut tuple),
                Some(value) => {
                    let field = encode_for_type(*target, value)?;
                    let len = i32::try_from(field.len())
                        .map_err(|_| DbLibError::Other("Copy field too large".to_string()))?;
                    write_value_into_bytes_be(len, &mut tuple);
                    tuple.extend_from_slice(&field);
                }
            }
        }
        self.body.extend_from_slice(&tuple);
        self.rows += 1;
        Ok(())
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// The complete payload including the trailer.
    #[must_use]
    pub fn as_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.body.len() + 2);
        out.extend_from_slice(&self.body);
        write_value_into_bytes_be(-1i16, &mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_tuples_and_trailer() -> Result<(), DbLibError> {
        let mut buffer = PgCopyBuffer::new(vec![ValueType::Short, ValueType::Varchar]);
        buffer.push_row(&[Some(Value::Int32(7)), Some(Value::from("ab"))])?;
        buffer.push_row(&[None, Some(Value::from(""))])?;
        let bytes = buffer.as_bytes();

        let mut expected = b"PGCOPY\n\xff\r\n\0".to_vec();
        expected.extend_from_slice(&[0, 0, 0, 0, 0, 0, 0, 0]);
        expected.extend_from_slice(&[0, 2, 0, 0, 0, 2, 0, 7, 0, 0, 0, 2, b'a', b'b']);
        expected.extend_from_slice(&[0, 2, 0xff, 0xff, 0xff, 0xff, 0, 0, 0, 0]);
        expected.extend_from_slice(&[0xff, 0xff]);
        assert_eq!(bytes, expected);
        Ok(())
    }

    #[test]
    fn bad_rows_leave_buffer_untouched() {
        let mut buffer = PgCopyBuffer::new(vec![ValueType::Short]);
        let before = buffer.as_bytes();
        assert!(buffer.push_row(&[Some(Value::Int32(70000))]).is_err());
        assert!(buffer.push_row(&[]).is_err());
        assert_eq!(buffer.as_bytes(), before);
        assert_eq!(buffer.rows(), 0);
    }
}
