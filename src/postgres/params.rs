use std::error::Error;
use std::fmt::Write as _;

use tokio_postgres::types::{FromSql, IsNull, ToSql, Type, to_sql_checked};
use tokio_util::bytes;

use super::codec::{
    decode_date, decode_time, decode_timestamp, encode_date, encode_time, encode_timestamp,
};
use crate::codec::{read_value_from_bytes_be, write_value_into_bytes_be};
use crate::conversion::{
    TypeConverterDataProvider, get_with_conversion, set_with_conversion, str_to_int,
};
use crate::error::DbLibError;
use crate::translation::SqlPreprocessorActions;
use crate::types::{Date, Time, Timestamp, ValueType};
use crate::value::{Value, ValueKind};

/// Placeholders become `$<slot>`; a repeated identifier keeps its first slot.
#[derive(Debug, Clone, Copy, Default)]
pub struct PgActions;

impl PgActions {
    pub const USE_NATIVE_FOR_PREPARE: bool = false;
    pub const SUPPORTS_INDEXED_PARAM_COALESCING: bool = true;
}

impl SqlPreprocessorActions for PgActions {
    fn append_index_param_to_sql(&self, _: &str, param_index: usize, sql: &mut String) {
        let _ = write!(sql, "${param_index}");
    }

    fn append_named_param_to_sql(&self, _: &str, param_index: usize, sql: &mut String) {
        let _ = write!(sql, "${param_index}");
    }

    fn append_if_seq_data(&self, data: &str, other: &str, sql: &mut String) {
        sql.push_str(data);
        sql.push_str(other);
    }

    fn append_seq_generator(&self, seq_name: &str, other: &str, sql: &mut String) {
        let _ = write!(sql, "nextval('{seq_name}'){other}");
    }
}

/// A parameter already in PostgreSQL binary form; `None` is NULL.
#[derive(Debug)]
pub(crate) struct PgRawParam<'a>(pub Option<&'a [u8]>);

impl ToSql for PgRawParam<'_> {
    fn to_sql(
        &self,
        _ty: &Type,
        out: &mut bytes::BytesMut,
    ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        match self.0 {
            Some(raw) => {
                out.extend_from_slice(raw);
                Ok(IsNull::No)
            }
            None => Ok(IsNull::Yes),
        }
    }

    // The bytes were encoded against the declared type at bind time.
    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

/// A column value in PostgreSQL binary form.
#[derive(Debug)]
pub(crate) struct PgRaw(pub Vec<u8>);

impl<'a> FromSql<'a> for PgRaw {
    fn from_sql(_ty: &Type, raw: &'a [u8]) -> Result<Self, Box<dyn Error + Sync + Send>> {
        Ok(PgRaw(raw.to_vec()))
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }
}

/// Binary-encoded values addressed by 1-based slot: a statement's parameters or one fetched row.
#[derive(Debug, Clone, Default)]
pub(crate) struct PgValues(Vec<Option<Vec<u8>>>);

impl PgValues {
    pub(crate) fn with_len(len: usize) -> Self {
        Self(vec![None; len])
    }

    pub(crate) fn from_cells(cells: Vec<Option<Vec<u8>>>) -> Self {
        Self(cells)
    }

    pub(crate) fn raw_params(&self) -> Vec<PgRawParam<'_>> {
        self.0.iter().map(|v| PgRawParam(v.as_deref())).collect()
    }

    /// `None` for NULL.
    pub(crate) fn raw(&self, index: usize) -> Result<Option<&[u8]>, DbLibError> {
        self.0
            .get(index.wrapping_sub(1))
            .map(Option::as_deref)
            .ok_or_else(|| DbLibError::ColumnNotFound(index.to_string()))
    }

    fn cell(&self, index: usize) -> Result<&[u8], DbLibError> {
        self.raw(index)?
            .ok_or_else(|| DbLibError::ColumnValueIsNull(index.to_string()))
    }

    fn put(&mut self, index: usize, bytes: Option<Vec<u8>>) -> Result<(), DbLibError> {
        let slot = self
            .0
            .get_mut(index.wrapping_sub(1))
            .ok_or_else(|| DbLibError::ParameterNotFound(index.to_string()))?;
        *slot = bytes;
        Ok(())
    }

    fn put_be<T: crate::codec::BigEndian>(
        &mut self,
        index: usize,
        value: T,
    ) -> Result<(), DbLibError> {
        let mut out = Vec::with_capacity(T::SIZE);
        write_value_into_bytes_be(value, &mut out);
        self.put(index, Some(out))
    }

    /// Encode `value` for a slot declared as `target`; `None` binds NULL.
    pub(crate) fn bind(
        &mut self,
        index: usize,
        target: ValueType,
        value: Option<&Value>,
    ) -> Result<(), DbLibError> {
        let Some(value) = value else {
            return self.put(index, None);
        };
        let bytes = match (value, target) {
            (Value::Date(d), ValueType::Date) => encode_date(d)?,
            (Value::Date(d), ValueType::Timestamp) => {
                encode_timestamp(&Timestamp::new(*d, Time::default()))?
            }
            (Value::Time(t), ValueType::Time) => encode_time(t)?,
            (Value::Timestamp(ts), ValueType::Timestamp) => encode_timestamp(ts)?,
            (Value::Timestamp(ts), ValueType::Date) => encode_date(&ts.date)?,
            (Value::Timestamp(ts), ValueType::Time) => encode_time(&ts.time)?,
            (Value::Date(d), ValueType::Char | ValueType::Varchar) => d.to_string().into_bytes(),
            (Value::Time(t), ValueType::Char | ValueType::Varchar) => t.to_string().into_bytes(),
            (Value::Timestamp(ts), ValueType::Char | ValueType::Varchar) => {
                ts.to_string().into_bytes()
            }
            (Value::Blob(b), ValueType::Blob | ValueType::Any) => b.clone(),
            (
                Value::Int16(_) | Value::Int32(_) | Value::Int64(_) | Value::Utf8(_),
                ValueType::Boolean,
            ) => vec![u8::from(bool_from_value(value)?)],
            (Value::Utf8(text), ValueType::Any | ValueType::Blob) => text.clone().into_bytes(),
            (
                Value::Int16(_)
                | Value::Int32(_)
                | Value::Int64(_)
                | Value::Float(_)
                | Value::Double(_)
                | Value::Utf8(_)
                | Value::Utf16(_),
                _,
            ) => return set_with_conversion(self, target, index, value),
            _ => return Err(DbLibError::type_conversion(value.kind(), target)),
        };
        self.put(index, Some(bytes))
    }

    /// Decode a non-NULL slot whose column type is `source` as `kind`.
    pub(crate) fn decode(
        &self,
        source: ValueType,
        index: usize,
        kind: ValueKind,
    ) -> Result<Value, DbLibError> {
        let raw = self.cell(index)?;
        let value = match (kind, source) {
            (ValueKind::Date, ValueType::Date) => Value::Date(decode_date(raw)?),
            (ValueKind::Date, ValueType::Timestamp) => Value::Date(decode_timestamp(raw)?.date),
            (ValueKind::Time, ValueType::Time) => Value::Time(decode_time(raw)?),
            (ValueKind::Time, ValueType::Timestamp) => Value::Time(decode_timestamp(raw)?.time),
            (ValueKind::Timestamp, ValueType::Timestamp) => {
                Value::Timestamp(decode_timestamp(raw)?)
            }
            (ValueKind::Timestamp, ValueType::Date) => {
                Value::Timestamp(Timestamp::new(decode_date(raw)?, Time::default()))
            }
            (
                ValueKind::Blob,
                ValueType::Blob | ValueType::Any | ValueType::Char | ValueType::Varchar,
            ) => Value::Blob(raw.to_vec()),
            (
                ValueKind::Utf8 | ValueKind::Utf16,
                ValueType::Date | ValueType::Time | ValueType::Timestamp | ValueType::Boolean,
            ) => {
                let text = match source {
                    ValueType::Date => decode_date(raw)?.to_string(),
                    ValueType::Time => decode_time(raw)?.to_string(),
                    ValueType::Timestamp => decode_timestamp(raw)?.to_string(),
                    _ => decode_bool(raw)?.to_string(),
                };
                if kind == ValueKind::Utf16 {
                    Value::Utf16(text.encode_utf16().collect())
                } else {
                    Value::Utf8(text)
                }
            }
            (_, ValueType::Boolean) => {
                let flag = i16::from(decode_bool(raw)?);
                match kind {
                    ValueKind::Int16 => Value::Int16(flag),
                    ValueKind::Int32 => Value::Int32(i32::from(flag)),
                    ValueKind::Int64 => Value::Int64(i64::from(flag)),
                    ValueKind::Float => Value::Float(f32::from(flag)),
                    ValueKind::Double => Value::Double(f64::from(flag)),
                    _ => return Err(DbLibError::type_conversion(source, kind)),
                }
            }
            _ => get_with_conversion(self, source, index, kind)?,
        };
        Ok(value)
    }
}

fn bool_from_value(value: &Value) -> Result<bool, DbLibError> {
    if let Some(v) = value.as_i64() {
        return Ok(v != 0);
    }
    match value {
        Value::Utf8(text) => match text.trim().to_ascii_lowercase().as_str() {
            "t" | "true" | "y" | "yes" | "on" => Ok(true),
            "f" | "false" | "n" | "no" | "off" => Ok(false),
            other => Ok(str_to_int::<i64>(other)? != 0),
        },
        _ => Err(DbLibError::type_conversion(value.kind(), ValueType::Boolean)),
    }
}

fn decode_bool(raw: &[u8]) -> Result<bool, DbLibError> {
    Ok(read_value_from_bytes_be::<u8>(raw)? != 0)
}

fn utf8(raw: &[u8]) -> Result<String, DbLibError> {
    String::from_utf8(raw.to_vec())
        .map_err(|_| DbLibError::type_conversion("invalid utf8 bytes", "utf8 string"))
}

impl TypeConverterDataProvider for PgValues {
    fn set_i16_impl(&mut self, index: usize, value: i16) -> Result<(), DbLibError> {
        self.put_be(index, value)
    }

    fn set_i32_impl(&mut self, index: usize, value: i32) -> Result<(), DbLibError> {
        self.put_be(index, value)
    }

    fn set_i64_impl(&mut self, index: usize, value: i64) -> Result<(), DbLibError> {
        self.put_be(index, value)
    }

    fn set_f32_impl(&mut self, index: usize, value: f32) -> Result<(), DbLibError> {
        self.put_be(index, value)
    }

    fn set_f64_impl(&mut self, index: usize, value: f64) -> Result<(), DbLibError> {
        self.put_be(index, value)
    }

    fn set_str_impl(&mut self, index: usize, value: &str) -> Result<(), DbLibError> {
        self.put(index, Some(value.as_bytes().to_vec()))
    }

    fn get_i16_impl(&self, index: usize) -> Result<i16, DbLibError> {
        read_value_from_bytes_be(self.cell(index)?)
    }

    fn get_i32_impl(&self, index: usize) -> Result<i32, DbLibError> {
        read_value_from_bytes_be(self.cell(index)?)
    }

    fn get_i64_impl(&self, index: usize) -> Result<i64, DbLibError> {
        read_value_from_bytes_be(self.cell(index)?)
    }

    fn get_f32_impl(&self, index: usize) -> Result<f32, DbLibError> {
        read_value_from_bytes_be(self.cell(index)?)
    }

    fn get_f64_impl(&self, index: usize) -> Result<f64, DbLibError> {
        read_value_from_bytes_be(self.cell(index)?)
    }

    fn get_str_impl(&self, index: usize) -> Result<String, DbLibError> {
        utf8(self.cell(index)?)
    }
}

/// Encode one value for a column of type `target`, as a parameter would be.
pub(crate) fn encode_for_type(target: ValueType, value: &Value) -> Result<Vec<u8>, DbLibError> {
    let mut slot = PgValues::with_len(1);
    slot.bind(1, target, Some(value))?;
    slot.0
        .pop()
        .flatten()
        .ok_or_else(|| DbLibError::Other("value encoded to nothing".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translation::preprocess;

    #[test]
    fn renders_dollar_slots() {
        let out = preprocess(
            "select * from t where a = :a and b = ?2 or c = :A",
            PgActions::USE_NATIVE_FOR_PREPARE,
            PgActions::SUPPORTS_INDEXED_PARAM_COALESCING,
            &PgActions,
        );
        assert_eq!(out.sql, "select * from t where a = $1 and b = $2 or c = $1");
        assert_eq!(out.params.native_count(), 2);
    }

    #[test]
    fn renders_sequences() {
        let out = preprocess(
            "insert into tbl({if_seq id,} text) values({next id_gen,} 'aaaa')",
            false,
            true,
            &PgActions,
        );
        assert_eq!(
            out.sql,
            "insert into tbl(id, text) values(nextval('id_gen'), 'aaaa')"
        );
    }

    #[test]
    fn raw_param_writes_bytes_verbatim() -> Result<(), Box<dyn Error + Sync + Send>> {
        let mut out = bytes::BytesMut::new();
        let raw = [0u8, 0, 0, 7];
        assert!(matches!(
            PgRawParam(Some(&raw)).to_sql(&Type::INT4, &mut out)?,
            IsNull::No
        ));
        assert_eq!(&out[..], &raw);
        assert!(matches!(
            PgRawParam(None).to_sql(&Type::INT4, &mut out)?,
            IsNull::Yes
        ));
        Ok(())
    }

    #[test]
    fn binds_against_declared_types() -> Result<(), DbLibError> {
        let mut params = PgValues::with_len(4);
        params.bind(1, ValueType::Short, Some(&Value::Int64(-2)))?;
        params.bind(2, ValueType::Double, Some(&Value::from("0.5")))?;
        params.bind(3, ValueType::Date, Some(&Value::Date(Date::new(2000, 1, 2))))?;
        params.bind(4, ValueType::Boolean, Some(&Value::Int32(5)))?;
        assert_eq!(params.raw(1)?, Some(&[0xff, 0xfe][..]));
        assert_eq!(params.raw(2)?, Some(&0.5f64.to_be_bytes()[..]));
        assert_eq!(params.raw(3)?, Some(&[0, 0, 0, 1][..]));
        assert_eq!(params.raw(4)?, Some(&[1][..]));

        params.bind(1, ValueType::Short, None)?;
        assert_eq!(params.raw(1)?, None);
        assert!(matches!(
            params.bind(1, ValueType::Short, Some(&Value::Int32(40_000))),
            Err(DbLibError::RangeExceeded(_))
        ));
        assert!(params.bind(5, ValueType::Short, Some(&Value::Int16(1))).is_err());
        Ok(())
    }

    #[test]
    fn decodes_by_column_type() -> Result<(), DbLibError> {
        let row = PgValues::from_cells(vec![
            Some(42i32.to_be_bytes().to_vec()),
            Some(b"abc  ".to_vec()),
            Some(encode_timestamp(&Timestamp::new(
                Date::new(2021, 6, 1),
                Time::new(8, 30, 0, 0),
            ))?),
            Some(vec![1]),
            None,
        ]);
        assert_eq!(
            row.decode(ValueType::Integer, 1, ValueKind::Utf8)?,
            Value::Utf8("42".into())
        );
        assert_eq!(
            row.decode(ValueType::Char, 2, ValueKind::Utf8)?,
            Value::Utf8("abc".into())
        );
        assert_eq!(
            row.decode(ValueType::Timestamp, 3, ValueKind::Date)?,
            Value::Date(Date::new(2021, 6, 1))
        );
        assert_eq!(
            row.decode(ValueType::Boolean, 4, ValueKind::Int32)?,
            Value::Int32(1)
        );
        assert_eq!(row.raw(5)?, None);
        assert!(row.decode(ValueType::Integer, 1, ValueKind::Date).is_err());
        Ok(())
    }
}
