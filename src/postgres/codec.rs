//! PostgreSQL binary wire forms for the crate's scalar types.
//!
//! Dates count days from 2000-01-01, times count microseconds from midnight and timestamps
//! combine the two in one `i64`.
use crate::codec::julian::{date_to_julianday_integer, julianday_integer_to_date};
use crate::codec::{read_value_from_bytes_be, write_value_into_bytes_be};
use crate::error::DbLibError;
use crate::types::{Date, Time, Timestamp, ValueType};

pub const BOOL_OID: u32 = 16;
pub const BYTEA_OID: u32 = 17;
pub const NAME_OID: u32 = 19;
pub const INT8_OID: u32 = 20;
pub const INT2_OID: u32 = 21;
pub const INT4_OID: u32 = 23;
pub const TEXT_OID: u32 = 25;
pub const FLOAT4_OID: u32 = 700;
pub const FLOAT8_OID: u32 = 701;
pub const BPCHAR_OID: u32 = 1042;
pub const VARCHAR_OID: u32 = 1043;
pub const DATE_OID: u32 = 1082;
pub const TIME_OID: u32 = 1083;
pub const TIMESTAMP_OID: u32 = 1114;

/// Julian day number of 2000-01-01.
const PG_EPOCH_JDN: i64 = 2_451_545;
const MICROS_PER_MILLI: i64 = 1000;
const MICROS_PER_DAY: i64 = 86_400_000_000;

#[must_use]
pub fn value_type_from_oid(oid: u32) -> ValueType {
    match oid {
        INT2_OID => ValueType::Short,
        INT4_OID => ValueType::Integer,
        INT8_OID => ValueType::BigInt,
        FLOAT4_OID => ValueType::Float,
        FLOAT8_OID => ValueType::Double,
        BPCHAR_OID => ValueType::Char,
        VARCHAR_OID | TEXT_OID | NAME_OID => ValueType::Varchar,
        DATE_OID => ValueType::Date,
        TIME_OID => ValueType::Time,
        TIMESTAMP_OID => ValueType::Timestamp,
        BYTEA_OID => ValueType::Blob,
        BOOL_OID => ValueType::Boolean,
        _ => ValueType::Any,
    }
}

/// # Errors
/// `RangeExceeded` for dates more than `i32::MAX` days from the epoch.
pub fn date_to_pg(date: &Date) -> Result<i32, DbLibError> {
    let days = date_to_julianday_integer(date) - PG_EPOCH_JDN;
    i32::try_from(days).map_err(|_| out_of_range(date))
}

fn out_of_range(what: impl std::fmt::Display) -> DbLibError {
    DbLibError::RangeExceeded(format!("{what} is out of range for PostgreSQL"))
}

/// # Errors
/// Never for days an `i32` can hold; kept fallible to share the Julian day checks.
pub fn pg_to_date(days: i32) -> Result<Date, DbLibError> {
    julianday_integer_to_date(i64::from(days) + PG_EPOCH_JDN)
}

/// Microseconds since midnight; `24:00:00` is the largest time PostgreSQL stores.
///
/// # Errors
/// `RangeExceeded` for times past the end of the day.
pub fn time_to_pg(time: &Time) -> Result<i64, DbLibError> {
    time.total_millis()
        .checked_mul(MICROS_PER_MILLI)
        .filter(|micros| *micros <= MICROS_PER_DAY)
        .ok_or_else(|| out_of_range(time))
}

#[must_use]
pub fn pg_to_time(micros: i64) -> Time {
    Time::from_millis(micros.rem_euclid(MICROS_PER_DAY) / MICROS_PER_MILLI)
}

/// # Errors
/// As [`date_to_pg`] and [`time_to_pg`], plus `RangeExceeded` when the microsecond count
/// overflows `i64` (around year 294000).
pub fn timestamp_to_pg(ts: &Timestamp) -> Result<i64, DbLibError> {
    let time = time_to_pg(&ts.time)?;
    i64::from(date_to_pg(&ts.date)?)
        .checked_mul(MICROS_PER_DAY)
        .and_then(|micros| micros.checked_add(time))
        .ok_or_else(|| out_of_range(ts))
}

/// # Errors
/// As [`pg_to_date`].
pub fn pg_to_timestamp(micros: i64) -> Result<Timestamp, DbLibError> {
    let days = micros.div_euclid(MICROS_PER_DAY);
    Ok(Timestamp::new(
        julianday_integer_to_date(days + PG_EPOCH_JDN)?,
        pg_to_time(micros.rem_euclid(MICROS_PER_DAY)),
    ))
}

pub(crate) fn encode_date(date: &Date) -> Result<Vec<u8>, DbLibError> {
    let mut out = Vec::with_capacity(4);
    write_value_into_bytes_be(date_to_pg(date)?, &mut out);
    Ok(out)
}

pub(crate) fn encode_time(time: &Time) -> Result<Vec<u8>, DbLibError> {
    let mut out = Vec::with_capacity(8);
    write_value_into_bytes_be(time_to_pg(time)?, &mut out);
    Ok(out)
}

pub(crate) fn encode_timestamp(ts: &Timestamp) -> Result<Vec<u8>, DbLibError> {
    let mut out = Vec::with_capacity(8);
    write_value_into_bytes_be(timestamp_to_pg(ts)?, &mut out);
    Ok(out)
}

pub(crate) fn decode_date(raw: &[u8]) -> Result<Date, DbLibError> {
    pg_to_date(read_value_from_bytes_be(raw)?)
}

pub(crate) fn decode_time(raw: &[u8]) -> Result<Time, DbLibError> {
    Ok(pg_to_time(read_value_from_bytes_be(raw)?))
}

pub(crate) fn decode_timestamp(raw: &[u8]) -> Result<Timestamp, DbLibError> {
    pg_to_timestamp(read_value_from_bytes_be(raw)?)
}
