use std::fmt;

use crate::types::{Date, Time, Timestamp, ValueType};

/// A scalar moved between the caller and a backend.
///
/// NULL is not a variant: every API that can see NULL takes or returns `Option<Value>`.
/// ```rust
/// use sql_dblib::prelude::*;
///
/// let v = Value::from("alice");
/// assert_eq!(v.kind(), ValueKind::Utf8);
/// let none: Option<Value> = None;
/// # let _ = none;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float(f32),
    Double(f64),
    Utf8(String),
    Utf16(Vec<u16>),
    Date(Date),
    Time(Time),
    Timestamp(Timestamp),
    Blob(Vec<u8>),
}

/// Tag of a [`Value`], used to ask a statement for a column in a particular shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Int16,
    Int32,
    Int64,
    Float,
    Double,
    Utf8,
    Utf16,
    Date,
    Time,
    Timestamp,
    Blob,
}

impl ValueKind {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Int16 => "int16",
            ValueKind::Int32 => "int32",
            ValueKind::Int64 => "int64",
            ValueKind::Float => "float",
            ValueKind::Double => "double",
            ValueKind::Utf8 => "utf8 string",
            ValueKind::Utf16 => "utf16 string",
            ValueKind::Date => "date",
            ValueKind::Time => "time",
            ValueKind::Timestamp => "timestamp",
            ValueKind::Blob => "blob",
        }
    }

    /// The slot type a backend without declared parameter types binds this kind as.
    #[must_use]
    pub fn natural_type(self) -> ValueType {
        match self {
            ValueKind::Int16 => ValueType::Short,
            ValueKind::Int32 => ValueType::Integer,
            ValueKind::Int64 => ValueType::BigInt,
            ValueKind::Float => ValueType::Float,
            ValueKind::Double => ValueType::Double,
            ValueKind::Utf8 | ValueKind::Utf16 => ValueType::Varchar,
            ValueKind::Date => ValueType::Date,
            ValueKind::Time => ValueType::Time,
            ValueKind::Timestamp => ValueType::Timestamp,
            ValueKind::Blob => ValueType::Blob,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Value {
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Int16(_) => ValueKind::Int16,
            Value::Int32(_) => ValueKind::Int32,
            Value::Int64(_) => ValueKind::Int64,
            Value::Float(_) => ValueKind::Float,
            Value::Double(_) => ValueKind::Double,
            Value::Utf8(_) => ValueKind::Utf8,
            Value::Utf16(_) => ValueKind::Utf16,
            Value::Date(_) => ValueKind::Date,
            Value::Time(_) => ValueKind::Time,
            Value::Timestamp(_) => ValueKind::Timestamp,
            Value::Blob(_) => ValueKind::Blob,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        if let Value::Utf8(s) = self {
            Some(s)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int16(v) => Some(i64::from(*v)),
            Value::Int32(v) => Some(i64::from(*v)),
            Value::Int64(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(f64::from(*v)),
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }
}

macro_rules! impl_value_from {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_value_from! {
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    f32 => Float,
    f64 => Double,
    String => Utf8,
    Vec<u16> => Utf16,
    Date => Date,
    Time => Time,
    Timestamp => Timestamp,
    Vec<u8> => Blob,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Utf8(v.to_string())
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Blob(v.to_vec())
    }
}
