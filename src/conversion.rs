//! Numeric and text coercion between the value model and backend slot types.
//!
//! Narrowing is always range checked in a wider common type (`i128` for integers, `f64` for
//! floats) before the cast; nothing relies on silent truncation. The same rules serve parameter
//! binding (`set_*_with_conversion`) and column extraction (`get_*_with_conversion`), with the
//! backend plugged in through [`TypeConverterDataProvider`].
use std::fmt::Display;

use crate::error::DbLibError;
use crate::types::ValueType;
use crate::value::{Value, ValueKind};

/// Integer types the engine converts between.
pub trait Integral: Copy + Display + Into<i128> + TryFrom<i128> {
    const TYPE_NAME: &'static str;
    const MIN_WIDE: i128;
    const MAX_WIDE: i128;
}

macro_rules! impl_integral {
    ($($t:ty => $name:literal),* $(,)?) => {
        $(
            impl Integral for $t {
                const TYPE_NAME: &'static str = $name;
                const MIN_WIDE: i128 = <$t>::MIN as i128;
                const MAX_WIDE: i128 = <$t>::MAX as i128;
            }
        )*
    };
}

impl_integral! {
    i8 => "int8",
    i16 => "int16",
    i32 => "int32",
    i64 => "int64",
    u8 => "uint8",
    u16 => "uint16",
    u32 => "uint32",
    u64 => "uint64",
}

/// Floating point types the engine converts between.
pub trait Floating: Copy + Display + Into<f64> {
    const TYPE_NAME: &'static str;
    const MAX_WIDE: f64;

    /// Unchecked narrowing from `f64`.
    fn from_wide(value: f64) -> Self;
}

impl Floating for f32 {
    const TYPE_NAME: &'static str = "float";
    const MAX_WIDE: f64 = f32::MAX as f64;

    #[allow(clippy::cast_possible_truncation)]
    fn from_wide(value: f64) -> Self {
        value as f32
    }
}

impl Floating for f64 {
    const TYPE_NAME: &'static str = "double";
    const MAX_WIDE: f64 = f64::MAX;

    fn from_wide(value: f64) -> Self {
        value
    }
}

fn range_error(
    value: impl Display,
    from: &str,
    to: &str,
    min: impl Display,
    max: impl Display,
) -> DbLibError {
    DbLibError::RangeExceeded(format!(
        "Value {value} of type {from} exceeds range for type {to} ({min} ... {max})"
    ))
}

fn narrow_int<T: Integral>(wide: i128, shown: impl Display, from: &str) -> Result<T, DbLibError> {
    T::try_from(wide)
        .map_err(|_| range_error(shown, from, T::TYPE_NAME, T::MIN_WIDE, T::MAX_WIDE))
}

fn narrow_float<T: Floating>(wide: f64, shown: impl Display, from: &str) -> Result<T, DbLibError> {
    if wide.is_finite() && wide.abs() > T::MAX_WIDE {
        return Err(range_error(
            shown,
            from,
            T::TYPE_NAME,
            -T::MAX_WIDE,
            T::MAX_WIDE,
        ));
    }
    Ok(T::from_wide(wide))
}

/// # Errors
/// Returns `DbLibError::RangeExceeded` if `value` does not fit in `T`.
pub fn int_to<T: Integral, S: Integral>(value: S) -> Result<T, DbLibError> {
    narrow_int(value.into(), value, S::TYPE_NAME)
}

#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn int_to_float<T: Floating, S: Integral>(value: S) -> T {
    let wide: i128 = value.into();
    T::from_wide(wide as f64)
}

/// Round half away from zero, then narrow.
///
/// # Errors
/// Returns `DbLibError::RangeExceeded` if the rounded value does not fit in `T` or is NaN.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub fn float_to_int<T: Integral, F: Floating>(value: F) -> Result<T, DbLibError> {
    let wide: f64 = value.into();
    let rounded = if wide < 0.0 { wide - 0.5 } else { wide + 0.5 }.trunc();
    // MIN and MAX + 1 are powers of two, exact in f64
    let in_range = rounded >= T::MIN_WIDE as f64 && rounded < (T::MAX_WIDE + 1) as f64;
    if !in_range {
        return Err(range_error(
            value,
            F::TYPE_NAME,
            T::TYPE_NAME,
            T::MIN_WIDE,
            T::MAX_WIDE,
        ));
    }
    narrow_int(rounded as i128, value, F::TYPE_NAME)
}

/// # Errors
/// Returns `DbLibError::RangeExceeded` if a finite `value` is outside `T`'s range.
pub fn float_to<T: Floating, F: Floating>(value: F) -> Result<T, DbLibError> {
    narrow_float(value.into(), value, F::TYPE_NAME)
}

/// # Errors
/// Returns `DbLibError::TypeConversion` if `text` is not an integer, or
/// `DbLibError::RangeExceeded` if it does not fit in `T`.
pub fn str_to_int<T: Integral>(text: &str) -> Result<T, DbLibError> {
    let wide: i128 = text
        .trim()
        .parse()
        .map_err(|_| DbLibError::type_conversion(format!("string '{text}'"), T::TYPE_NAME))?;
    narrow_int(wide, text.trim(), "string")
}

/// # Errors
/// Returns `DbLibError::TypeConversion` if `text` is not a number, or
/// `DbLibError::RangeExceeded` if it does not fit in `T`.
pub fn str_to_float<T: Floating>(text: &str) -> Result<T, DbLibError> {
    let wide: f64 = text
        .trim()
        .parse()
        .map_err(|_| DbLibError::type_conversion(format!("string '{text}'"), T::TYPE_NAME))?;
    narrow_float(wide, text.trim(), "string")
}

fn utf16_to_string(value: &[u16]) -> Result<String, DbLibError> {
    String::from_utf16(value)
        .map_err(|_| DbLibError::type_conversion("utf16 string", "utf8 string"))
}

fn trim_char(text: &str) -> &str {
    text.trim_end_matches(' ')
}

/// Typed landing points of a backend statement, addressed by 1-based native slot.
///
/// Setters bind into the statement's parameter buffer, getters read the current row. Errors are
/// whatever the backend reports for a failed bind or decode.
pub trait TypeConverterDataProvider {
    fn set_i16_impl(&mut self, index: usize, value: i16) -> Result<(), DbLibError>;
    fn set_i32_impl(&mut self, index: usize, value: i32) -> Result<(), DbLibError>;
    fn set_i64_impl(&mut self, index: usize, value: i64) -> Result<(), DbLibError>;
    fn set_f32_impl(&mut self, index: usize, value: f32) -> Result<(), DbLibError>;
    fn set_f64_impl(&mut self, index: usize, value: f64) -> Result<(), DbLibError>;
    fn set_str_impl(&mut self, index: usize, value: &str) -> Result<(), DbLibError>;

    /// # Errors
    /// Fails on unpaired surrogates, or as `set_str_impl`.
    fn set_wstr_impl(&mut self, index: usize, value: &[u16]) -> Result<(), DbLibError> {
        let text = utf16_to_string(value)?;
        self.set_str_impl(index, &text)
    }

    fn get_i16_impl(&self, index: usize) -> Result<i16, DbLibError>;
    fn get_i32_impl(&self, index: usize) -> Result<i32, DbLibError>;
    fn get_i64_impl(&self, index: usize) -> Result<i64, DbLibError>;
    fn get_f32_impl(&self, index: usize) -> Result<f32, DbLibError>;
    fn get_f64_impl(&self, index: usize) -> Result<f64, DbLibError>;
    fn get_str_impl(&self, index: usize) -> Result<String, DbLibError>;

    /// # Errors
    /// As `get_str_impl`.
    fn get_wstr_impl(&self, index: usize) -> Result<Vec<u16>, DbLibError> {
        Ok(self.get_str_impl(index)?.encode_utf16().collect())
    }
}

/// Bind an integer into a slot declared as `target`.
///
/// # Errors
/// `RangeExceeded` on overflow, `TypeConversion` for a non-numeric, non-text target.
pub fn set_int_with_conversion<P, S>(
    provider: &mut P,
    target: ValueType,
    index: usize,
    value: S,
) -> Result<(), DbLibError>
where
    P: TypeConverterDataProvider + ?Sized,
    S: Integral,
{
    match target {
        ValueType::Short => provider.set_i16_impl(index, int_to(value)?),
        ValueType::Integer => provider.set_i32_impl(index, int_to(value)?),
        ValueType::BigInt => provider.set_i64_impl(index, int_to(value)?),
        ValueType::Float => provider.set_f32_impl(index, int_to_float(value)),
        ValueType::Double => provider.set_f64_impl(index, int_to_float(value)),
        ValueType::Char | ValueType::Varchar => provider.set_str_impl(index, &value.to_string()),
        _ => Err(DbLibError::type_conversion(S::TYPE_NAME, target)),
    }
}

/// # Errors
/// `RangeExceeded` on overflow, `TypeConversion` for a non-numeric, non-text target.
pub fn set_float_with_conversion<P, F>(
    provider: &mut P,
    target: ValueType,
    index: usize,
    value: F,
) -> Result<(), DbLibError>
where
    P: TypeConverterDataProvider + ?Sized,
    F: Floating,
{
    match target {
        ValueType::Short => provider.set_i16_impl(index, float_to_int(value)?),
        ValueType::Integer => provider.set_i32_impl(index, float_to_int(value)?),
        ValueType::BigInt => provider.set_i64_impl(index, float_to_int(value)?),
        ValueType::Float => provider.set_f32_impl(index, float_to(value)?),
        ValueType::Double => provider.set_f64_impl(index, float_to(value)?),
        ValueType::Char | ValueType::Varchar => provider.set_str_impl(index, &value.to_string()),
        _ => Err(DbLibError::type_conversion(F::TYPE_NAME, target)),
    }
}

/// # Errors
/// `TypeConversion` for unparsable text or an unsupported target, `RangeExceeded` on overflow.
pub fn set_str_with_conversion<P>(
    provider: &mut P,
    target: ValueType,
    index: usize,
    value: &str,
) -> Result<(), DbLibError>
where
    P: TypeConverterDataProvider + ?Sized,
{
    match target {
        ValueType::Short => provider.set_i16_impl(index, str_to_int(value)?),
        ValueType::Integer => provider.set_i32_impl(index, str_to_int(value)?),
        ValueType::BigInt => provider.set_i64_impl(index, str_to_int(value)?),
        ValueType::Float => provider.set_f32_impl(index, str_to_float(value)?),
        ValueType::Double => provider.set_f64_impl(index, str_to_float(value)?),
        ValueType::Char | ValueType::Varchar => provider.set_str_impl(index, value),
        _ => Err(DbLibError::type_conversion("utf8 string", target)),
    }
}

/// # Errors
/// As [`set_str_with_conversion`], plus `TypeConversion` for invalid UTF-16.
pub fn set_wstr_with_conversion<P>(
    provider: &mut P,
    target: ValueType,
    index: usize,
    value: &[u16],
) -> Result<(), DbLibError>
where
    P: TypeConverterDataProvider + ?Sized,
{
    match target {
        ValueType::Char | ValueType::Varchar => provider.set_wstr_impl(index, value),
        ValueType::Short
        | ValueType::Integer
        | ValueType::BigInt
        | ValueType::Float
        | ValueType::Double => {
            set_str_with_conversion(provider, target, index, &utf16_to_string(value)?)
        }
        _ => Err(DbLibError::type_conversion("utf16 string", target)),
    }
}

/// Read an integer out of a slot whose native type is `source`.
///
/// # Errors
/// `RangeExceeded` on overflow, `TypeConversion` for unparsable text or unsupported sources.
pub fn get_int_with_conversion<T, P>(
    provider: &P,
    source: ValueType,
    index: usize,
) -> Result<T, DbLibError>
where
    T: Integral,
    P: TypeConverterDataProvider + ?Sized,
{
    match source {
        ValueType::Short => int_to(provider.get_i16_impl(index)?),
        ValueType::Integer => int_to(provider.get_i32_impl(index)?),
        ValueType::BigInt => int_to(provider.get_i64_impl(index)?),
        ValueType::Float => float_to_int(provider.get_f32_impl(index)?),
        ValueType::Double => float_to_int(provider.get_f64_impl(index)?),
        ValueType::Char => str_to_int(trim_char(&provider.get_str_impl(index)?)),
        ValueType::Varchar => str_to_int(&provider.get_str_impl(index)?),
        _ => Err(DbLibError::type_conversion(source, T::TYPE_NAME)),
    }
}

/// # Errors
/// `RangeExceeded` on overflow, `TypeConversion` for unparsable text or unsupported sources.
pub fn get_float_with_conversion<T, P>(
    provider: &P,
    source: ValueType,
    index: usize,
) -> Result<T, DbLibError>
where
    T: Floating,
    P: TypeConverterDataProvider + ?Sized,
{
    match source {
        ValueType::Short => Ok(int_to_float(provider.get_i16_impl(index)?)),
        ValueType::Integer => Ok(int_to_float(provider.get_i32_impl(index)?)),
        ValueType::BigInt => Ok(int_to_float(provider.get_i64_impl(index)?)),
        ValueType::Float => float_to(provider.get_f32_impl(index)?),
        ValueType::Double => float_to(provider.get_f64_impl(index)?),
        ValueType::Char => str_to_float(trim_char(&provider.get_str_impl(index)?)),
        ValueType::Varchar => str_to_float(&provider.get_str_impl(index)?),
        _ => Err(DbLibError::type_conversion(source, T::TYPE_NAME)),
    }
}

/// # Errors
/// `TypeConversion` for sources with no text form here (dates, blobs, ...).
pub fn get_str_with_conversion<P>(
    provider: &P,
    source: ValueType,
    index: usize,
) -> Result<String, DbLibError>
where
    P: TypeConverterDataProvider + ?Sized,
{
    match source {
        ValueType::Short => Ok(provider.get_i16_impl(index)?.to_string()),
        ValueType::Integer => Ok(provider.get_i32_impl(index)?.to_string()),
        ValueType::BigInt => Ok(provider.get_i64_impl(index)?.to_string()),
        ValueType::Float => Ok(provider.get_f32_impl(index)?.to_string()),
        ValueType::Double => Ok(provider.get_f64_impl(index)?.to_string()),
        ValueType::Char => {
            let mut text = provider.get_str_impl(index)?;
            text.truncate(trim_char(&text).len());
            Ok(text)
        }
        ValueType::Varchar => provider.get_str_impl(index),
        _ => Err(DbLibError::type_conversion(source, "utf8 string")),
    }
}

/// # Errors
/// As [`get_str_with_conversion`].
pub fn get_wstr_with_conversion<P>(
    provider: &P,
    source: ValueType,
    index: usize,
) -> Result<Vec<u16>, DbLibError>
where
    P: TypeConverterDataProvider + ?Sized,
{
    match source {
        ValueType::Varchar => provider.get_wstr_impl(index),
        ValueType::Char => {
            let mut text = provider.get_wstr_impl(index)?;
            while text.last() == Some(&u16::from(b' ')) {
                text.pop();
            }
            Ok(text)
        }
        _ => Ok(get_str_with_conversion(provider, source, index)?
            .encode_utf16()
            .collect()),
    }
}

/// Bind a numeric or text `value` into a slot declared as `target`.
///
/// Dates, times, timestamps and blobs have backend-specific encodings and are rejected here.
///
/// # Errors
/// As the typed `set_*_with_conversion` functions.
pub fn set_with_conversion<P>(
    provider: &mut P,
    target: ValueType,
    index: usize,
    value: &Value,
) -> Result<(), DbLibError>
where
    P: TypeConverterDataProvider + ?Sized,
{
    match value {
        Value::Int16(v) => set_int_with_conversion(provider, target, index, *v),
        Value::Int32(v) => set_int_with_conversion(provider, target, index, *v),
        Value::Int64(v) => set_int_with_conversion(provider, target, index, *v),
        Value::Float(v) => set_float_with_conversion(provider, target, index, *v),
        Value::Double(v) => set_float_with_conversion(provider, target, index, *v),
        Value::Utf8(v) => set_str_with_conversion(provider, target, index, v),
        Value::Utf16(v) => set_wstr_with_conversion(provider, target, index, v),
        Value::Date(_) | Value::Time(_) | Value::Timestamp(_) | Value::Blob(_) => {
            Err(DbLibError::type_conversion(value.kind(), target))
        }
    }
}

/// Read the slot as a value of `kind`. The mirror of [`set_with_conversion`].
///
/// # Errors
/// As the typed `get_*_with_conversion` functions.
pub fn get_with_conversion<P>(
    provider: &P,
    source: ValueType,
    index: usize,
    kind: ValueKind,
) -> Result<Value, DbLibError>
where
    P: TypeConverterDataProvider + ?Sized,
{
    Ok(match kind {
        ValueKind::Int16 => Value::Int16(get_int_with_conversion(provider, source, index)?),
        ValueKind::Int32 => Value::Int32(get_int_with_conversion(provider, source, index)?),
        ValueKind::Int64 => Value::Int64(get_int_with_conversion(provider, source, index)?),
        ValueKind::Float => Value::Float(get_float_with_conversion(provider, source, index)?),
        ValueKind::Double => Value::Double(get_float_with_conversion(provider, source, index)?),
        ValueKind::Utf8 => Value::Utf8(get_str_with_conversion(provider, source, index)?),
        ValueKind::Utf16 => Value::Utf16(get_wstr_with_conversion(provider, source, index)?),
        ValueKind::Date | ValueKind::Time | ValueKind::Timestamp | ValueKind::Blob => {
            return Err(DbLibError::type_conversion(source, kind));
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Stores whatever lands in each slot; getters read from `row`.
    #[derive(Default)]
    struct Slots {
        set: Vec<(usize, Value)>,
        row: Vec<Value>,
    }

    impl Slots {
        fn with_row(row: Vec<Value>) -> Self {
            Self {
                set: Vec::new(),
                row,
            }
        }

        fn cell(&self, index: usize) -> Result<&Value, DbLibError> {
            self.row
                .get(index - 1)
                .ok_or_else(|| DbLibError::ColumnNotFound(index.to_string()))
        }
    }

    macro_rules! slot_getter {
        ($name:ident, $t:ty, $variant:ident) => {
            fn $name(&self, index: usize) -> Result<$t, DbLibError> {
                match self.cell(index)? {
                    Value::$variant(v) => Ok(v.clone()),
                    other => Err(DbLibError::type_conversion(other.kind(), stringify!($t))),
                }
            }
        };
    }

    impl TypeConverterDataProvider for Slots {
        fn set_i16_impl(&mut self, index: usize, value: i16) -> Result<(), DbLibError> {
            self.set.push((index, Value::Int16(value)));
            Ok(())
        }
        fn set_i32_impl(&mut self, index: usize, value: i32) -> Result<(), DbLibError> {
            self.set.push((index, Value::Int32(value)));
            Ok(())
        }
        fn set_i64_impl(&mut self, index: usize, value: i64) -> Result<(), DbLibError> {
            self.set.push((index, Value::Int64(value)));
            Ok(())
        }
        fn set_f32_impl(&mut self, index: usize, value: f32) -> Result<(), DbLibError> {
            self.set.push((index, Value::Float(value)));
            Ok(())
        }
        fn set_f64_impl(&mut self, index: usize, value: f64) -> Result<(), DbLibError> {
            self.set.push((index, Value::Double(value)));
            Ok(())
        }
        fn set_str_impl(&mut self, index: usize, value: &str) -> Result<(), DbLibError> {
            self.set.push((index, Value::Utf8(value.to_string())));
            Ok(())
        }

        slot_getter!(get_i16_impl, i16, Int16);
        slot_getter!(get_i32_impl, i32, Int32);
        slot_getter!(get_i64_impl, i64, Int64);
        slot_getter!(get_f32_impl, f32, Float);
        slot_getter!(get_f64_impl, f64, Double);
        slot_getter!(get_str_impl, String, Utf8);
    }

    #[test]
    fn int_range_checks_are_exact() {
        let err = int_to::<i32, u64>(i32::MAX as u64 + 1);
        match err {
            Err(DbLibError::RangeExceeded(msg)) => assert_eq!(
                msg,
                "Value 2147483648 of type uint64 exceeds range for type int32 \
                 (-2147483648 ... 2147483647)"
            ),
            other => panic!("expected range error, got {other:?}"),
        }
        assert_eq!(int_to::<i32, i32>(i32::MAX).ok(), Some(i32::MAX));
        assert_eq!(int_to::<i16, i64>(-32768).ok(), Some(i16::MIN));
        assert!(int_to::<i16, i64>(-32769).is_err());
        assert!(int_to::<u8, i16>(-1).is_err());
    }

    #[test]
    fn floats_round_half_away_from_zero() {
        assert_eq!(float_to_int::<i32, f64>(2.5).ok(), Some(3));
        assert_eq!(float_to_int::<i32, f64>(-2.5).ok(), Some(-3));
        assert_eq!(float_to_int::<i32, f64>(2.49).ok(), Some(2));
        assert_eq!(float_to_int::<i32, f32>(-2.49).ok(), Some(-2));
        assert_eq!(float_to_int::<i16, f64>(32767.4).ok(), Some(i16::MAX));
        assert!(float_to_int::<i16, f64>(32767.5).is_err());
        assert!(float_to_int::<i64, f64>(9.3e18).is_err());
        assert!(float_to_int::<i32, f64>(f64::NAN).is_err());
    }

    #[test]
    fn float_narrowing_is_range_checked() {
        assert!(float_to::<f32, f64>(1e39).is_err());
        assert!(float_to::<f32, f64>(-1e39).is_err());
        assert_eq!(float_to::<f32, f64>(0.5).ok(), Some(0.5));
        assert_eq!(float_to::<f64, f32>(1.5).ok(), Some(1.5));
    }

    #[test]
    fn strings_parse_then_check_range() {
        assert_eq!(str_to_int::<i16>(" 42 ").ok(), Some(42));
        assert!(matches!(
            str_to_int::<i16>("70000"),
            Err(DbLibError::RangeExceeded(_))
        ));
        assert!(matches!(
            str_to_int::<i32>("4x"),
            Err(DbLibError::TypeConversion { .. })
        ));
        assert_eq!(str_to_float::<f64>("-1.25").ok(), Some(-1.25));
        assert!(str_to_float::<f32>("1e40").is_err());
    }

    #[test]
    fn set_dispatches_on_target_type() -> Result<(), DbLibError> {
        let mut slots = Slots::default();
        set_int_with_conversion(&mut slots, ValueType::Short, 1, 12i64)?;
        set_int_with_conversion(&mut slots, ValueType::Varchar, 2, 70000i32)?;
        set_float_with_conversion(&mut slots, ValueType::BigInt, 3, -7.5f64)?;
        set_str_with_conversion(&mut slots, ValueType::Double, 4, "0.25")?;
        let wide: Vec<u16> = "17".encode_utf16().collect();
        set_wstr_with_conversion(&mut slots, ValueType::Integer, 5, &wide)?;
        set_wstr_with_conversion(&mut slots, ValueType::Char, 6, &wide)?;
        assert_eq!(
            slots.set,
            vec![
                (1, Value::Int16(12)),
                (2, Value::Utf8("70000".into())),
                (3, Value::Int64(-8)),
                (4, Value::Double(0.25)),
                (5, Value::Int32(17)),
                (6, Value::Utf8("17".into())),
            ]
        );

        assert!(matches!(
            set_int_with_conversion(&mut slots, ValueType::Short, 1, 70000i32),
            Err(DbLibError::RangeExceeded(_))
        ));
        let err = set_int_with_conversion(&mut slots, ValueType::Date, 1, 1i32);
        assert!(matches!(err, Err(DbLibError::TypeConversion { ref from, ref to })
            if from == "int32" && to == "date"));
        Ok(())
    }

    #[test]
    fn get_dispatches_on_source_type() -> Result<(), DbLibError> {
        let slots = Slots::with_row(vec![
            Value::Int64(300),
            Value::Double(1.5),
            Value::Utf8("12  ".into()),
            Value::Utf8("abc   ".into()),
        ]);
        assert_eq!(get_int_with_conversion::<i32, _>(&slots, ValueType::BigInt, 1)?, 300);
        assert!(get_int_with_conversion::<i8, _>(&slots, ValueType::BigInt, 1).is_err());
        assert_eq!(get_int_with_conversion::<i16, _>(&slots, ValueType::Double, 2)?, 2);
        assert_eq!(get_int_with_conversion::<i64, _>(&slots, ValueType::Char, 3)?, 12);
        assert_eq!(get_float_with_conversion::<f32, _>(&slots, ValueType::BigInt, 1)?, 300.0);
        assert_eq!(get_str_with_conversion(&slots, ValueType::Double, 2)?, "1.5");
        assert_eq!(get_str_with_conversion(&slots, ValueType::Char, 4)?, "abc");
        assert_eq!(get_str_with_conversion(&slots, ValueType::Varchar, 4)?, "abc   ");
        assert_eq!(
            get_wstr_with_conversion(&slots, ValueType::Char, 4)?,
            "abc".encode_utf16().collect::<Vec<_>>()
        );
        assert!(get_str_with_conversion(&slots, ValueType::Blob, 1).is_err());
        Ok(())
    }

    #[test]
    fn value_routing() -> Result<(), DbLibError> {
        let mut slots = Slots::with_row(vec![Value::Int32(5)]);
        set_with_conversion(&mut slots, ValueType::Double, 1, &Value::Int32(5))?;
        assert_eq!(slots.set, vec![(1, Value::Double(5.0))]);
        assert_eq!(
            get_with_conversion(&slots, ValueType::Integer, 1, ValueKind::Utf8)?,
            Value::Utf8("5".into())
        );
        assert!(
            get_with_conversion(&slots, ValueType::Integer, 1, ValueKind::Date).is_err()
        );
        Ok(())
    }
}
