use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::types::Value as SqlValue;

use crate::codec::julian::{
    date_to_julianday, days_to_time, julianday_to_timestamp, time_to_days, timestamp_to_julianday,
};
use crate::error::DbLibError;
use crate::translation::SqlPreprocessorActions;
use crate::types::{Date, Time, Timestamp, ValueType};

/// `SQLite` understands `?NNN`, `:name`, `@name` and `$name` itself, so placeholders are kept
/// as written. Keys come from rowid assignment, so the sequence templates render nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteActions;

impl SqliteActions {
    pub const USE_NATIVE_FOR_PREPARE: bool = false;
    pub const SUPPORTS_INDEXED_PARAM_COALESCING: bool = false;
}

impl SqlPreprocessorActions for SqliteActions {
    fn append_index_param_to_sql(&self, param_text: &str, _: usize, sql: &mut String) {
        sql.push_str(param_text);
    }

    fn append_named_param_to_sql(&self, param_text: &str, _: usize, sql: &mut String) {
        sql.push_str(param_text);
    }

    fn append_if_seq_data(&self, _: &str, _: &str, _: &mut String) {}

    fn append_seq_generator(&self, _: &str, _: &str, _: &mut String) {}
}

/// Storage class of a fetched value.
pub(crate) fn sqlite_value_type(value: &SqlValue) -> ValueType {
    match value {
        SqlValue::Null => ValueType::Null,
        SqlValue::Integer(_) => ValueType::BigInt,
        SqlValue::Real(_) => ValueType::Double,
        SqlValue::Text(_) => ValueType::Varchar,
        SqlValue::Blob(_) => ValueType::Blob,
    }
}

/// Column type from its declaration, following `SQLite`'s affinity rules.
pub(crate) fn decl_type_to_value_type(decl: Option<&str>) -> ValueType {
    let Some(decl) = decl else {
        return ValueType::Any;
    };
    let upper = decl.to_ascii_uppercase();
    match upper.as_str() {
        "DATE" => return ValueType::Date,
        "TIME" => return ValueType::Time,
        "TIMESTAMP" | "DATETIME" => return ValueType::Timestamp,
        _ => {}
    }
    if upper.contains("INT") {
        ValueType::BigInt
    } else if upper.contains("CHAR") || upper.contains("CLOB") || upper.contains("TEXT") {
        ValueType::Varchar
    } else if upper.contains("BLOB") || upper.is_empty() {
        ValueType::Blob
    } else if upper.contains("REAL") || upper.contains("FLOA") || upper.contains("DOUB") {
        ValueType::Double
    } else {
        ValueType::Any
    }
}

pub(crate) fn date_to_sqlite(date: &Date) -> f64 {
    date_to_julianday(date)
}

pub(crate) fn time_to_sqlite(time: &Time) -> f64 {
    time_to_days(time)
}

pub(crate) fn timestamp_to_sqlite(ts: &Timestamp) -> f64 {
    timestamp_to_julianday(ts)
}

const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

fn unsupported(value: &SqlValue, to: &str) -> DbLibError {
    DbLibError::type_conversion(sqlite_value_type(value), to)
}

#[allow(clippy::cast_precision_loss)]
pub(crate) fn timestamp_from_sqlite(value: &SqlValue) -> Result<Timestamp, DbLibError> {
    match value {
        SqlValue::Real(jd) => julianday_to_timestamp(*jd),
        SqlValue::Integer(jd) => julianday_to_timestamp(*jd as f64),
        SqlValue::Text(text) => TIMESTAMP_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
            .map(Timestamp::from)
            .or_else(|| {
                NaiveDate::parse_from_str(text, "%Y-%m-%d")
                    .ok()
                    .map(|d| Timestamp::new(d.into(), Time::default()))
            })
            .ok_or_else(|| DbLibError::type_conversion(format!("string '{text}'"), "timestamp")),
        other => Err(unsupported(other, "timestamp")),
    }
}

pub(crate) fn date_from_sqlite(value: &SqlValue) -> Result<Date, DbLibError> {
    timestamp_from_sqlite(value).map(|ts| ts.date)
}

pub(crate) fn time_from_sqlite(value: &SqlValue) -> Result<Time, DbLibError> {
    match value {
        SqlValue::Real(fraction) => Ok(days_to_time(*fraction)),
        SqlValue::Text(text) => NaiveTime::parse_from_str(text, "%H:%M:%S%.f")
            .map(Time::from)
            .or_else(|_| timestamp_from_sqlite(value).map(|ts| ts.time)),
        other => Err(unsupported(other, "time")),
    }
}

pub(crate) fn blob_from_sqlite(value: &SqlValue) -> Result<Vec<u8>, DbLibError> {
    match value {
        SqlValue::Blob(bytes) => Ok(bytes.clone()),
        SqlValue::Text(text) => Ok(text.as_bytes().to_vec()),
        other => Err(unsupported(other, "blob")),
    }
}
