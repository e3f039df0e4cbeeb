use std::fmt;
use std::time::Duration;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::DbLibError;

/// Backend-declared type of a parameter slot or result column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Any,
    None,
    Integer,
    Short,
    BigInt,
    Char,
    Varchar,
    Boolean,
    Float,
    Double,
    Date,
    Time,
    Timestamp,
    Blob,
    Null,
}

impl ValueType {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            ValueType::Any => "any",
            ValueType::None => "none",
            ValueType::Integer => "integer",
            ValueType::Short => "short",
            ValueType::BigInt => "bigint",
            ValueType::Char => "char",
            ValueType::Varchar => "varchar",
            ValueType::Boolean => "boolean",
            ValueType::Float => "float",
            ValueType::Double => "double",
            ValueType::Date => "date",
            ValueType::Time => "time",
            ValueType::Timestamp => "timestamp",
            ValueType::Blob => "blob",
            ValueType::Null => "null",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Database engines known to the crate; each backend module is behind a cargo feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    /// `PostgreSQL` database
    Postgres,
    /// `SQLite` database
    Sqlite,
    /// SQL Server database
    Mssql,
}

impl fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DatabaseType::Postgres => "postgres",
            DatabaseType::Sqlite => "sqlite",
            DatabaseType::Mssql => "mssql",
        })
    }
}

/// Kind of a statement, judged from its leading keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StatementType {
    #[default]
    Unknown,
    Insert,
    Select,
    Update,
    Delete,
    Other,
}

impl StatementType {
    /// Classify `sql` by its first keyword, skipping whitespace, comments and opening
    /// parentheses. Text with no keyword is `Unknown`.
    #[must_use]
    pub fn of_sql(sql: &str) -> Self {
        let mut rest = sql;
        loop {
            let trimmed = rest.trim_start_matches(|c: char| c.is_whitespace() || c == '(');
            if let Some(comment) = trimmed.strip_prefix("--") {
                rest = comment.split_once('\n').map_or("", |(_, tail)| tail);
            } else if let Some(comment) = trimmed.strip_prefix("/*") {
                rest = comment.split_once("*/").map_or("", |(_, tail)| tail);
            } else {
                rest = trimmed;
                break;
            }
        }
        let keyword: String = rest
            .chars()
            .take_while(char::is_ascii_alphabetic)
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match keyword.as_str() {
            "" => StatementType::Unknown,
            "select" | "values" => StatementType::Select,
            "insert" => StatementType::Insert,
            "update" => StatementType::Update,
            "delete" => StatementType::Delete,
            _ => StatementType::Other,
        }
    }
}

/// Calendar date, proleptic Gregorian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Date {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl Date {
    #[must_use]
    pub const fn new(year: i32, month: u32, day: u32) -> Self {
        Self { year, month, day }
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// Time of day with millisecond precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Time {
    pub hour: u32,
    pub min: u32,
    pub sec: u32,
    pub msec: u32,
}

impl Time {
    #[must_use]
    pub const fn new(hour: u32, min: u32, sec: u32, msec: u32) -> Self {
        Self {
            hour,
            min,
            sec,
            msec,
        }
    }

    /// Milliseconds since midnight.
    #[must_use]
    pub fn total_millis(&self) -> i64 {
        ((i64::from(self.hour) * 60 + i64::from(self.min)) * 60 + i64::from(self.sec)) * 1000
            + i64::from(self.msec)
    }

    /// Inverse of [`Time::total_millis`]; `millis` must lie within one day.
    #[must_use]
    pub fn from_millis(millis: i64) -> Self {
        let millis = millis.rem_euclid(86_400_000);
        // Every component below fits in u32 after the euclidean reduction above.
        Self {
            hour: u32::try_from(millis / 3_600_000).unwrap_or_default(),
            min: u32::try_from(millis / 60_000 % 60).unwrap_or_default(),
            sec: u32::try_from(millis / 1000 % 60).unwrap_or_default(),
            msec: u32::try_from(millis % 1000).unwrap_or_default(),
        }
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}.{:03}",
            self.hour, self.min, self.sec, self.msec
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Timestamp {
    pub date: Date,
    pub time: Time,
}

impl Timestamp {
    #[must_use]
    pub const fn new(date: Date, time: Time) -> Self {
        Self { date, time }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.date, self.time)
    }
}

impl From<NaiveDate> for Date {
    fn from(d: NaiveDate) -> Self {
        Self::new(d.year(), d.month(), d.day())
    }
}

impl TryFrom<Date> for NaiveDate {
    type Error = DbLibError;

    fn try_from(d: Date) -> Result<Self, Self::Error> {
        NaiveDate::from_ymd_opt(d.year, d.month, d.day)
            .ok_or_else(|| DbLibError::type_conversion(format!("date {d}"), "chrono::NaiveDate"))
    }
}

impl From<NaiveTime> for Time {
    fn from(t: NaiveTime) -> Self {
        // chrono encodes a leap second as nanos >= 1_000_000_000
        let msec = (t.nanosecond() / 1_000_000).min(999);
        Self::new(t.hour(), t.minute(), t.second(), msec)
    }
}

impl TryFrom<Time> for NaiveTime {
    type Error = DbLibError;

    fn try_from(t: Time) -> Result<Self, Self::Error> {
        NaiveTime::from_hms_milli_opt(t.hour, t.min, t.sec, t.msec)
            .ok_or_else(|| DbLibError::type_conversion(format!("time {t}"), "chrono::NaiveTime"))
    }
}

impl From<NaiveDateTime> for Timestamp {
    fn from(ts: NaiveDateTime) -> Self {
        Self::new(ts.date().into(), ts.time().into())
    }
}

impl TryFrom<Timestamp> for NaiveDateTime {
    type Error = DbLibError;

    fn try_from(ts: Timestamp) -> Result<Self, Self::Error> {
        Ok(NaiveDateTime::new(ts.date.try_into()?, ts.time.try_into()?))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TransactionAccess {
    Read,
    #[default]
    ReadWrite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TransactionLevel {
    /// Whatever the server is configured with.
    #[default]
    Default,
    Serializable,
    RepeatableRead,
    ReadCommitted,
    DirtyRead,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LockResolution {
    #[default]
    Wait,
    NoWait,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionState {
    #[default]
    Undefined,
    Started,
    Committed,
    RolledBack,
}

/// Options applied when a transaction is opened.
///
/// ```rust
/// use std::time::Duration;
/// use sql_dblib::prelude::*;
///
/// let params = TransactionParams::default()
///     .with_access(TransactionAccess::Read)
///     .with_lock_time_out(Duration::from_secs(5));
/// assert!(params.autostart);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionParams {
    pub access: TransactionAccess,
    pub level: TransactionLevel,
    pub lock_resolution: LockResolution,
    pub lock_time_out: Duration,
    pub autostart: bool,
    pub auto_commit_on_destroy: bool,
}

impl Default for TransactionParams {
    fn default() -> Self {
        Self {
            access: TransactionAccess::default(),
            level: TransactionLevel::default(),
            lock_resolution: LockResolution::default(),
            lock_time_out: Duration::from_secs(1),
            autostart: true,
            auto_commit_on_destroy: true,
        }
    }
}

impl TransactionParams {
    #[must_use]
    pub fn with_access(mut self, access: TransactionAccess) -> Self {
        self.access = access;
        self
    }

    #[must_use]
    pub fn with_level(mut self, level: TransactionLevel) -> Self {
        self.level = level;
        self
    }

    #[must_use]
    pub fn with_lock_resolution(mut self, lock_resolution: LockResolution) -> Self {
        self.lock_resolution = lock_resolution;
        self
    }

    #[must_use]
    pub fn with_lock_time_out(mut self, lock_time_out: Duration) -> Self {
        self.lock_time_out = lock_time_out;
        self
    }

    #[must_use]
    pub fn with_autostart(mut self, autostart: bool) -> Self {
        self.autostart = autostart;
        self
    }

    #[must_use]
    pub fn with_auto_commit_on_destroy(mut self, auto_commit_on_destroy: bool) -> Self {
        self.auto_commit_on_destroy = auto_commit_on_destroy;
        self
    }

    /// How long to wait on a lock; zero under [`LockResolution::NoWait`].
    #[must_use]
    pub fn effective_lock_time_out(&self) -> Duration {
        match self.lock_resolution {
            LockResolution::Wait => self.lock_time_out,
            LockResolution::NoWait => Duration::ZERO,
        }
    }
}
