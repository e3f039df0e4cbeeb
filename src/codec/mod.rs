//! Fixed-width big-endian encoding and the Julian-day calendar arithmetic that every backend's
//! date/time epoch is derived from.
pub mod julian;

use crate::error::DbLibError;

/// Fixed-width values with a big-endian wire form. Floats travel as their IEEE bit pattern.
pub trait BigEndian: Sized + Copy {
    const SIZE: usize;

    fn write_be(self, buffer: &mut Vec<u8>);

    /// `bytes` is exactly `SIZE` long.
    fn read_be(bytes: &[u8]) -> Self;
}

macro_rules! impl_big_endian_int {
    ($($t:ty),*) => {
        $(
            impl BigEndian for $t {
                const SIZE: usize = std::mem::size_of::<$t>();

                fn write_be(self, buffer: &mut Vec<u8>) {
                    buffer.extend_from_slice(&self.to_be_bytes());
                }

                fn read_be(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$t>()];
                    raw.copy_from_slice(bytes);
                    <$t>::from_be_bytes(raw)
                }
            }
        )*
    };
}

impl_big_endian_int!(i8, u8, i16, u16, i32, u32, i64, u64);

macro_rules! impl_big_endian_float {
    ($($t:ty => $bits:ty),*) => {
        $(
            impl BigEndian for $t {
                const SIZE: usize = std::mem::size_of::<$bits>();

                fn write_be(self, buffer: &mut Vec<u8>) {
                    self.to_bits().write_be(buffer);
                }

                fn read_be(bytes: &[u8]) -> Self {
                    <$t>::from_bits(<$bits>::read_be(bytes))
                }
            }
        )*
    };
}

impl_big_endian_float!(f32 => u32, f64 => u64);

/// Append `value` to `buffer`, most significant byte first.
pub fn write_value_into_bytes_be<T: BigEndian>(value: T, buffer: &mut Vec<u8>) {
    value.write_be(buffer);
}

/// Read a `T` from the first `T::SIZE` bytes of `buffer`.
///
/// # Errors
/// Returns `DbLibError::TypeConversion` when `buffer` is shorter than `T::SIZE`.
pub fn read_value_from_bytes_be<T: BigEndian>(buffer: &[u8]) -> Result<T, DbLibError> {
    buffer
        .get(..T::SIZE)
        .map(T::read_be)
        .ok_or_else(|| {
            DbLibError::type_conversion(
                format!("{} byte buffer", buffer.len()),
                format!("{} byte value", T::SIZE),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_are_written_msb_first() {
        let mut buf = Vec::new();
        write_value_into_bytes_be(0x0102_0304i32, &mut buf);
        write_value_into_bytes_be(-2i16, &mut buf);
        assert_eq!(buf, [1, 2, 3, 4, 0xff, 0xfe]);
        assert_eq!(read_value_from_bytes_be::<i32>(&buf).ok(), Some(0x0102_0304));
        assert_eq!(read_value_from_bytes_be::<i16>(&buf[4..]).ok(), Some(-2));
    }

    #[test]
    fn floats_use_their_bit_pattern() {
        let mut buf = Vec::new();
        write_value_into_bytes_be(1.0f64, &mut buf);
        assert_eq!(buf, [0x3f, 0xf0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(read_value_from_bytes_be::<f64>(&buf).ok(), Some(1.0));

        buf.clear();
        write_value_into_bytes_be(-0.5f32, &mut buf);
        assert_eq!(buf, [0xbf, 0, 0, 0]);
    }

    #[test]
    fn short_buffer_is_an_error() {
        assert!(read_value_from_bytes_be::<i64>(&[0, 1, 2]).is_err());
    }
}
