use std::borrow::Cow;
use std::fmt::Write as _;

use tiberius::{ColumnData, ColumnType, ToSql};

use super::codec::{
    date_to_mssql, mssql_datetime_to_timestamp, mssql_smalldatetime_to_timestamp, mssql_to_date,
    mssql_to_time, mssql_to_timestamp, time_to_mssql, timestamp_to_mssql,
};
use crate::conversion::{
    TypeConverterDataProvider, float_to, get_with_conversion, set_with_conversion, str_to_float,
};
use crate::error::DbLibError;
use crate::translation::SqlPreprocessorActions;
use crate::types::{Time, Timestamp, ValueType};
use crate::value::{Value, ValueKind};

/// Placeholders become `@P<slot>`; a repeated identifier keeps its first slot.
#[derive(Debug, Clone, Copy, Default)]
pub struct MssqlActions;

impl MssqlActions {
    pub const USE_NATIVE_FOR_PREPARE: bool = false;
    pub const SUPPORTS_INDEXED_PARAM_COALESCING: bool = true;
}

impl SqlPreprocessorActions for MssqlActions {
    fn append_index_param_to_sql(&self, _: &str, param_index: usize, sql: &mut String) {
        let _ = write!(sql, "@P{param_index}");
    }

    fn append_named_param_to_sql(&self, _: &str, param_index: usize, sql: &mut String) {
        let _ = write!(sql, "@P{param_index}");
    }

    fn append_if_seq_data(&self, data: &str, other: &str, sql: &mut String) {
        sql.push_str(data);
        sql.push_str(other);
    }

    fn append_seq_generator(&self, seq_name: &str, other: &str, sql: &mut String) {
        let _ = write!(sql, "NEXT VALUE FOR {seq_name}{other}");
    }
}

/// One bound parameter, handed to tiberius as is.
#[derive(Debug)]
pub(crate) struct MssqlParam<'a>(pub &'a ColumnData<'static>);

impl ToSql for MssqlParam<'_> {
    fn to_sql(&self) -> ColumnData<'_> {
        self.0.clone()
    }
}

const NULL: ColumnData<'static> = ColumnData::String(None);

pub(crate) fn is_null(cell: &ColumnData<'_>) -> bool {
    match cell {
        ColumnData::U8(v) => v.is_none(),
        ColumnData::I16(v) => v.is_none(),
        ColumnData::I32(v) => v.is_none(),
        ColumnData::I64(v) => v.is_none(),
        ColumnData::F32(v) => v.is_none(),
        ColumnData::F64(v) => v.is_none(),
        ColumnData::Bit(v) => v.is_none(),
        ColumnData::String(v) => v.is_none(),
        ColumnData::Guid(v) => v.is_none(),
        ColumnData::Binary(v) => v.is_none(),
        ColumnData::Numeric(v) => v.is_none(),
        ColumnData::Xml(v) => v.is_none(),
        ColumnData::DateTime(v) => v.is_none(),
        ColumnData::SmallDateTime(v) => v.is_none(),
        ColumnData::Time(v) => v.is_none(),
        ColumnData::Date(v) => v.is_none(),
        ColumnData::DateTime2(v) => v.is_none(),
        ColumnData::DateTimeOffset(v) => v.is_none(),
    }
}

/// Native type of a fetched value.
pub(crate) fn mssql_value_type(cell: &ColumnData<'_>) -> ValueType {
    match cell {
        ColumnData::U8(_) | ColumnData::I16(_) => ValueType::Short,
        ColumnData::I32(_) => ValueType::Integer,
        ColumnData::I64(_) => ValueType::BigInt,
        ColumnData::F32(_) => ValueType::Float,
        ColumnData::F64(_) | ColumnData::Numeric(_) => ValueType::Double,
        ColumnData::Bit(_) => ValueType::Boolean,
        ColumnData::String(_) | ColumnData::Guid(_) => ValueType::Varchar,
        ColumnData::Binary(_) => ValueType::Blob,
        ColumnData::Date(_) => ValueType::Date,
        ColumnData::Time(_) => ValueType::Time,
        ColumnData::DateTime(_)
        | ColumnData::SmallDateTime(_)
        | ColumnData::DateTime2(_)
        | ColumnData::DateTimeOffset(_) => ValueType::Timestamp,
        ColumnData::Xml(_) => ValueType::Any,
    }
}

/// Declared type of a result column.
pub(crate) fn column_type_to_value_type(ty: ColumnType) -> ValueType {
    match ty {
        ColumnType::Int1 | ColumnType::Int2 => ValueType::Short,
        ColumnType::Int4 => ValueType::Integer,
        ColumnType::Int8 | ColumnType::Intn => ValueType::BigInt,
        ColumnType::Float4 => ValueType::Float,
        ColumnType::Float8
        | ColumnType::Floatn
        | ColumnType::Decimaln
        | ColumnType::Numericn
        | ColumnType::Money
        | ColumnType::Money4 => ValueType::Double,
        ColumnType::BigChar | ColumnType::NChar => ValueType::Char,
        ColumnType::BigVarChar
        | ColumnType::NVarchar
        | ColumnType::Text
        | ColumnType::NText
        | ColumnType::Guid => ValueType::Varchar,
        ColumnType::Daten => ValueType::Date,
        ColumnType::Timen => ValueType::Time,
        ColumnType::Datetime
        | ColumnType::Datetime4
        | ColumnType::Datetimen
        | ColumnType::Datetime2
        | ColumnType::DatetimeOffsetn => ValueType::Timestamp,
        ColumnType::BigVarBin | ColumnType::BigBinary | ColumnType::Image => ValueType::Blob,
        ColumnType::Bit | ColumnType::Bitn => ValueType::Boolean,
        _ => ValueType::Any,
    }
}

/// `None` for cells that hold no date.
fn timestamp_of(cell: &ColumnData<'_>) -> Result<Option<Timestamp>, DbLibError> {
    let ts = match cell {
        ColumnData::DateTime2(Some(v)) => mssql_to_timestamp(*v)?,
        ColumnData::DateTimeOffset(Some(v)) => mssql_to_timestamp(v.datetime2())?,
        ColumnData::DateTime(Some(v)) => mssql_datetime_to_timestamp(*v)?,
        ColumnData::SmallDateTime(Some(v)) => mssql_smalldatetime_to_timestamp(*v)?,
        ColumnData::Date(Some(v)) => Timestamp::new(mssql_to_date(*v)?, Time::default()),
        _ => return Ok(None),
    };
    Ok(Some(ts))
}

/// Parameters of a statement or one fetched row, addressed by 1-based slot.
#[derive(Debug, Clone, Default)]
pub(crate) struct MssqlValues(Vec<ColumnData<'static>>);

impl MssqlValues {
    pub(crate) fn with_len(len: usize) -> Self {
        Self(vec![NULL; len])
    }

    pub(crate) fn from_cells(cells: Vec<ColumnData<'static>>) -> Self {
        Self(cells)
    }

    pub(crate) fn params(&self) -> Vec<MssqlParam<'_>> {
        self.0.iter().map(MssqlParam).collect()
    }

    pub(crate) fn cell(&self, index: usize) -> Result<&ColumnData<'static>, DbLibError> {
        self.0
            .get(index.wrapping_sub(1))
            .ok_or_else(|| DbLibError::ColumnNotFound(index.to_string()))
    }

    fn put(&mut self, index: usize, data: ColumnData<'static>) -> Result<(), DbLibError> {
        let slot = self
            .0
            .get_mut(index.wrapping_sub(1))
            .ok_or_else(|| DbLibError::ParameterNotFound(index.to_string()))?;
        *slot = data;
        Ok(())
    }

    /// SQL Server reports no parameter types, so each value is bound in its own native type.
    pub(crate) fn bind(&mut self, index: usize, value: Option<&Value>) -> Result<(), DbLibError> {
        let Some(value) = value else {
            return self.put(index, NULL);
        };
        let data = match value {
            Value::Date(d) => ColumnData::Date(Some(date_to_mssql(d)?)),
            Value::Time(t) => ColumnData::Time(Some(time_to_mssql(t)?)),
            Value::Timestamp(ts) => ColumnData::DateTime2(Some(timestamp_to_mssql(ts)?)),
            Value::Blob(b) => ColumnData::Binary(Some(Cow::Owned(b.clone()))),
            other => return set_with_conversion(self, other.kind().natural_type(), index, other),
        };
        self.put(index, data)
    }

    /// Decode a non-NULL cell as `kind`.
    pub(crate) fn decode(&self, index: usize, kind: ValueKind) -> Result<Value, DbLibError> {
        let cell = self.cell(index)?;
        let source = mssql_value_type(cell);
        let mismatch = || DbLibError::type_conversion(source, kind);
        let value = match kind {
            ValueKind::Date => Value::Date(timestamp_of(cell)?.ok_or_else(mismatch)?.date),
            ValueKind::Timestamp => Value::Timestamp(timestamp_of(cell)?.ok_or_else(mismatch)?),
            ValueKind::Time => match cell {
                ColumnData::Time(Some(t)) => Value::Time(mssql_to_time(*t)),
                _ => Value::Time(timestamp_of(cell)?.ok_or_else(mismatch)?.time),
            },
            ValueKind::Blob => match cell {
                ColumnData::Binary(Some(b)) => Value::Blob(b.to_vec()),
                ColumnData::String(Some(s)) => Value::Blob(s.as_bytes().to_vec()),
                _ => return Err(mismatch()),
            },
            ValueKind::Utf8 | ValueKind::Utf16 if !matches!(cell, ColumnData::String(_)) => {
                let text = match cell {
                    ColumnData::Time(Some(t)) => mssql_to_time(*t).to_string(),
                    ColumnData::Bit(Some(b)) => u8::from(*b).to_string(),
                    ColumnData::Guid(Some(g)) => g.to_string(),
                    ColumnData::Numeric(Some(n)) => n.to_string(),
                    _ => match timestamp_of(cell)? {
                        Some(ts) if matches!(cell, ColumnData::Date(_)) => ts.date.to_string(),
                        Some(ts) => ts.to_string(),
                        None => return get_with_conversion(self, source, index, kind),
                    },
                };
                if kind == ValueKind::Utf16 {
                    Value::Utf16(text.encode_utf16().collect())
                } else {
                    Value::Utf8(text)
                }
            }
            ValueKind::Int16 | ValueKind::Int32 | ValueKind::Int64
                if matches!(cell, ColumnData::Bit(_)) =>
            {
                get_with_conversion(self, ValueType::Short, index, kind)?
            }
            _ => get_with_conversion(self, source, index, kind)?,
        };
        Ok(value)
    }
}

fn mismatch(cell: &ColumnData<'_>, to: &str) -> DbLibError {
    DbLibError::type_conversion(mssql_value_type(cell), to)
}

impl TypeConverterDataProvider for MssqlValues {
    fn set_i16_impl(&mut self, index: usize, value: i16) -> Result<(), DbLibError> {
        self.put(index, ColumnData::I16(Some(value)))
    }

    fn set_i32_impl(&mut self, index: usize, value: i32) -> Result<(), DbLibError> {
        self.put(index, ColumnData::I32(Some(value)))
    }

    fn set_i64_impl(&mut self, index: usize, value: i64) -> Result<(), DbLibError> {
        self.put(index, ColumnData::I64(Some(value)))
    }

    fn set_f32_impl(&mut self, index: usize, value: f32) -> Result<(), DbLibError> {
        self.put(index, ColumnData::F32(Some(value)))
    }

    fn set_f64_impl(&mut self, index: usize, value: f64) -> Result<(), DbLibError> {
        self.put(index, ColumnData::F64(Some(value)))
    }

    fn set_str_impl(&mut self, index: usize, value: &str) -> Result<(), DbLibError> {
        self.put(index, ColumnData::String(Some(Cow::Owned(value.to_string()))))
    }

    fn get_i16_impl(&self, index: usize) -> Result<i16, DbLibError> {
        match self.cell(index)? {
            ColumnData::I16(Some(v)) => Ok(*v),
            ColumnData::U8(Some(v)) => Ok(i16::from(*v)),
            ColumnData::Bit(Some(v)) => Ok(i16::from(*v)),
            other => Err(mismatch(other, "int16")),
        }
    }

    fn get_i32_impl(&self, index: usize) -> Result<i32, DbLibError> {
        match self.cell(index)? {
            ColumnData::I32(Some(v)) => Ok(*v),
            other => Err(mismatch(other, "int32")),
        }
    }

    fn get_i64_impl(&self, index: usize) -> Result<i64, DbLibError> {
        match self.cell(index)? {
            ColumnData::I64(Some(v)) => Ok(*v),
            other => Err(mismatch(other, "int64")),
        }
    }

    fn get_f32_impl(&self, index: usize) -> Result<f32, DbLibError> {
        match self.cell(index)? {
            ColumnData::F32(Some(v)) => Ok(*v),
            ColumnData::F64(Some(v)) => float_to(*v),
            other => Err(mismatch(other, "float")),
        }
    }

    fn get_f64_impl(&self, index: usize) -> Result<f64, DbLibError> {
        match self.cell(index)? {
            ColumnData::F64(Some(v)) => Ok(*v),
            ColumnData::Numeric(Some(n)) => str_to_float(&n.to_string()),
            other => Err(mismatch(other, "double")),
        }
    }

    fn get_str_impl(&self, index: usize) -> Result<String, DbLibError> {
        match self.cell(index)? {
            ColumnData::String(Some(s)) => Ok(s.to_string()),
            ColumnData::Guid(Some(g)) => Ok(g.to_string()),
            other => Err(mismatch(other, "utf8 string")),
        }
    }
}
