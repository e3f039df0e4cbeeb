//! Julian day arithmetic.
//!
//! Julian day numbers count days from noon, 24 November 4714 BC (proleptic Gregorian).
//! A fractional Julian day therefore starts at noon, which is why timestamp conversions shift
//! by half a day.
use crate::error::DbLibError;
use crate::types::{Date, Time, Timestamp};

const MS_PER_DAY: f64 = 86_400_000.0;
/// Added before truncating a day fraction so values a hair below a millisecond boundary
/// land on it.
const DAY_FRACTION_EPSILON: f64 = 1.0 / (MS_PER_DAY * 10.0);

#[must_use]
pub fn date_to_julianday_integer(date: &Date) -> i64 {
    let month = i64::from(date.month);
    let a = (14 - month).div_euclid(12);
    let y = i64::from(date.year) + 4800 - a;
    let m = month + 12 * a - 3;
    i64::from(date.day) + (153 * m + 2).div_euclid(5) + 365 * y + y.div_euclid(4)
        - y.div_euclid(100)
        + y.div_euclid(400)
        - 32045
}

/// Julian day numbers whose dates have a year that fits in `Date::year`.
fn julianday_range() -> (i64, i64) {
    (
        date_to_julianday_integer(&Date::new(i32::MIN, 1, 1)),
        date_to_julianday_integer(&Date::new(i32::MAX, 12, 31)),
    )
}

fn julianday_out_of_range(jd: impl std::fmt::Display) -> DbLibError {
    let (min, max) = julianday_range();
    DbLibError::RangeExceeded(format!(
        "Julian day {jd} exceeds range for type date ({min} ... {max})"
    ))
}

/// # Errors
/// `RangeExceeded` when the year of `jdn` does not fit in `i32`.
pub fn julianday_integer_to_date(jdn: i64) -> Result<Date, DbLibError> {
    let (min, max) = julianday_range();
    if !(min..=max).contains(&jdn) {
        return Err(julianday_out_of_range(jdn));
    }
    let a = jdn + 32044;
    let b = (4 * a + 3).div_euclid(146_097);
    let c = a - (146_097 * b).div_euclid(4);
    let d = (4 * c + 3).div_euclid(1461);
    let e = c - (1461 * d).div_euclid(4);
    let m = (5 * e + 2).div_euclid(153);
    let day = e - (153 * m + 2).div_euclid(5) + 1;
    let month = m + 3 - 12 * m.div_euclid(10);
    let year = 100 * b + d - 4800 + m.div_euclid(10);
    // month and day are bounded by the arithmetic above; the year by the range check
    Ok(Date {
        year: i32::try_from(year).map_err(|_| julianday_out_of_range(jdn))?,
        month: u32::try_from(month).map_err(|_| julianday_out_of_range(jdn))?,
        day: u32::try_from(day).map_err(|_| julianday_out_of_range(jdn))?,
    })
}

/// Fraction of a day elapsed at `time`.
#[must_use]
pub fn time_to_days(time: &Time) -> f64 {
    f64::from(time.hour) / 24.0
        + f64::from(time.min) / 1440.0
        + f64::from(time.sec) / 86_400.0
        + f64::from(time.msec) / MS_PER_DAY
}

/// Time of day for the fractional part of `days`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn days_to_time(days: f64) -> Time {
    let mut fraction = days - days.floor() + DAY_FRACTION_EPSILON;
    if fraction >= 1.0 {
        fraction -= 1.0;
    }
    let hours = fraction * 24.0;
    let hour = hours as u32;
    let minutes = (hours - f64::from(hour)) * 60.0;
    let min = minutes as u32;
    let seconds = (minutes - f64::from(min)) * 60.0;
    let sec = seconds as u32;
    let msec = ((seconds - f64::from(sec)) * 1000.0) as u32;
    Time {
        hour: hour.min(23),
        min: min.min(59),
        sec: sec.min(59),
        msec: msec.min(999),
    }
}

/// Julian day of midnight at the start of `date`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn date_to_julianday(date: &Date) -> f64 {
    date_to_julianday_integer(date) as f64 - 0.5
}

#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn timestamp_to_julianday(ts: &Timestamp) -> f64 {
    date_to_julianday_integer(&ts.date) as f64 + time_to_days(&ts.time) - 0.5
}

/// # Errors
/// `RangeExceeded` for non-finite values and days outside [`julianday_integer_to_date`]'s range.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn julianday_to_timestamp(julianday: f64) -> Result<Timestamp, DbLibError> {
    let shifted = julianday + 0.5;
    // same epsilon as days_to_time, so a fraction rounded up to midnight moves the date too
    let day = (shifted + DAY_FRACTION_EPSILON).floor();
    let (min, max) = julianday_range();
    if !day.is_finite() || day < min as f64 || day > max as f64 {
        return Err(julianday_out_of_range(julianday));
    }
    Ok(Timestamp {
        date: julianday_integer_to_date(day as i64)?,
        time: days_to_time(shifted),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_day_numbers() -> Result<(), DbLibError> {
        assert_eq!(date_to_julianday_integer(&Date::new(2000, 1, 1)), 2_451_545);
        assert_eq!(date_to_julianday_integer(&Date::new(1858, 11, 17)), 2_400_001);
        assert_eq!(date_to_julianday_integer(&Date::new(1, 1, 1)), 1_721_426);
        assert_eq!(date_to_julianday_integer(&Date::new(-4713, 11, 24)), 0);
        assert_eq!(julianday_integer_to_date(2_451_545)?, Date::new(2000, 1, 1));
        assert_eq!(julianday_integer_to_date(2_460_370)?, Date::new(2024, 2, 29));
        assert_eq!(julianday_integer_to_date(-1)?, Date::new(-4713, 11, 23));
        Ok(())
    }

    #[test]
    fn date_round_trip_over_a_wide_range() -> Result<(), DbLibError> {
        for jdn in (-2_000_000..2_800_000).step_by(997) {
            let date = julianday_integer_to_date(jdn)?;
            assert_eq!(date_to_julianday_integer(&date), jdn);
        }
        Ok(())
    }

    #[test]
    fn extreme_years_round_trip() -> Result<(), DbLibError> {
        for date in [Date::new(i32::MIN, 1, 1), Date::new(i32::MAX, 12, 31)] {
            let jdn = date_to_julianday_integer(&date);
            assert_eq!(julianday_integer_to_date(jdn)?, date);
        }
        Ok(())
    }

    #[test]
    fn days_outside_the_date_range_are_errors() {
        let (min, max) = julianday_range();
        for jdn in [i64::MAX, i64::MIN, max + 1, min - 1] {
            assert!(matches!(
                julianday_integer_to_date(jdn),
                Err(DbLibError::RangeExceeded(_))
            ));
        }
        for jd in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY, 9.223_372_036_854_776e18, -1e300] {
            assert!(matches!(
                julianday_to_timestamp(jd),
                Err(DbLibError::RangeExceeded(_))
            ));
        }
    }

    #[test]
    fn timestamp_round_trip_is_exact() -> Result<(), DbLibError> {
        let date = Date::new(2020, 1, 5);
        for hour in 0..24 {
            for sec in 0..60 {
                for msec in 0..1000 {
                    let ts = Timestamp::new(date, Time::new(hour, 57, sec, msec));
                    assert_eq!(julianday_to_timestamp(timestamp_to_julianday(&ts))?, ts);
                }
            }
        }
        Ok(())
    }

    #[test]
    fn day_fraction_round_trip_is_exact() {
        for ms in (0..86_400_000).step_by(7919) {
            let time = Time::from_millis(ms);
            assert_eq!(days_to_time(time_to_days(&time)), time);
        }
    }
}
