//! SQL Server date and time wire forms.
//!
//! `date` counts days from 0001-01-01, `time` and `datetime2` count 100 ns ticks at scale 7,
//! the legacy `datetime` counts days from 1900-01-01 plus 1/300 s ticks and `smalldatetime`
//! counts days from 1900-01-01 plus minutes.
use tiberius::time::{
    Date as TdsDate, DateTime as TdsDateTime, DateTime2 as TdsDateTime2,
    SmallDateTime as TdsSmallDateTime, Time as TdsTime,
};

use crate::codec::julian::{date_to_julianday_integer, julianday_integer_to_date};
use crate::error::DbLibError;
use crate::types::{Date, Time, Timestamp};

/// Julian day number of 0001-01-01.
const DATE_EPOCH_JDN: i64 = 1_721_426;
/// Julian day number of 1900-01-01.
const DATETIME_EPOCH_JDN: i64 = 2_415_021;
/// Days from 0001-01-01 to 9999-12-31, the last `date` the server accepts.
const MAX_DATE_DAYS: u32 = 3_652_058;
const TIME_SCALE: u8 = 7;
const TICKS_PER_MILLI: u64 = 10_000;
const MILLIS_PER_DAY: u64 = 86_400_000;

fn out_of_range(what: impl std::fmt::Display) -> DbLibError {
    DbLibError::RangeExceeded(format!("{what} is out of range for SQL Server"))
}

/// # Errors
/// `RangeExceeded` for dates outside 0001-01-01 ... 9999-12-31.
pub fn date_to_mssql(date: &Date) -> Result<TdsDate, DbLibError> {
    let days = date_to_julianday_integer(date) - DATE_EPOCH_JDN;
    u32::try_from(days)
        .ok()
        .filter(|&days| days <= MAX_DATE_DAYS)
        .map(TdsDate::new)
        .ok_or_else(|| out_of_range(date))
}

/// # Errors
/// Never for days a `u32` can hold; kept fallible to share the Julian day checks.
pub fn mssql_to_date(date: TdsDate) -> Result<Date, DbLibError> {
    julianday_integer_to_date(i64::from(date.days()) + DATE_EPOCH_JDN)
}

/// # Errors
/// `RangeExceeded` for times at or past the end of the day.
pub fn time_to_mssql(time: &Time) -> Result<TdsTime, DbLibError> {
    u64::try_from(time.total_millis())
        .ok()
        .filter(|millis| *millis < MILLIS_PER_DAY)
        .map(|millis| TdsTime::new(millis * TICKS_PER_MILLI, TIME_SCALE))
        .ok_or_else(|| out_of_range(time))
}

#[must_use]
pub fn mssql_to_time(time: TdsTime) -> Time {
    let rescale = 10u64.pow(u32::from(TIME_SCALE.saturating_sub(time.scale())));
    let ticks = time.increments() * rescale;
    Time::from_millis(i64::try_from(ticks / TICKS_PER_MILLI).unwrap_or_default())
}

/// # Errors
/// As [`date_to_mssql`] and [`time_to_mssql`].
pub fn timestamp_to_mssql(ts: &Timestamp) -> Result<TdsDateTime2, DbLibError> {
    Ok(TdsDateTime2::new(
        date_to_mssql(&ts.date)?,
        time_to_mssql(&ts.time)?,
    ))
}

/// # Errors
/// As [`mssql_to_date`].
pub fn mssql_to_timestamp(ts: TdsDateTime2) -> Result<Timestamp, DbLibError> {
    Ok(Timestamp::new(mssql_to_date(ts.date())?, mssql_to_time(ts.time())))
}

/// Legacy `datetime`, whose time counts 1/300 s ticks.
///
/// # Errors
/// As [`mssql_to_date`].
pub fn mssql_datetime_to_timestamp(dt: TdsDateTime) -> Result<Timestamp, DbLibError> {
    let millis = (i64::from(dt.seconds_fragments()) * 10 + 1) / 3;
    Ok(Timestamp::new(
        julianday_integer_to_date(i64::from(dt.days()) + DATETIME_EPOCH_JDN)?,
        Time::from_millis(millis),
    ))
}

/// # Errors
/// As [`mssql_to_date`].
pub fn mssql_smalldatetime_to_timestamp(dt: TdsSmallDateTime) -> Result<Timestamp, DbLibError> {
    Ok(Timestamp::new(
        julianday_integer_to_date(i64::from(dt.days()) + DATETIME_EPOCH_JDN)?,
        Time::from_millis(i64::from(dt.seconds_fragments()) * 60_000),
    ))
}
