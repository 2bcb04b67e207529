//! A deterministic binary codec for values that cross the wire or feed a
//! commitment digest. Collections are length-prefixed with big-endian `u32`s,
//! matching the nested-call argument encoding understood by contract SDKs.

use thiserror::Error;

/// The number of bytes in a serialized `u32`.
pub const U32_SERIALIZED_LENGTH: usize = 4;

/// Decoding error.
#[derive(Error, Debug, Copy, Clone, Eq, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// The input ended before the value was fully decoded.
    #[error("deserialization error: early end of stream")]
    EarlyEndOfStream,
    /// The input is structurally invalid.
    #[error("deserialization error: formatting")]
    Formatting,
}

/// A value with a deterministic binary representation.
pub trait ToBytes {
    /// Appends the representation of `self` to `writer`.
    fn write_bytes(&self, writer: &mut Vec<u8>);

    /// Returns the representation of `self` as a byte vector.
    fn to_bytes(&self) -> Vec<u8> {
        let mut writer = Vec::new();
        self.write_bytes(&mut writer);
        writer
    }
}

/// A value decodable from its deterministic binary representation.
pub trait FromBytes: Sized {
    /// Decodes a value from the front of `bytes`, returning it along with the
    /// remainder of the input.
    fn from_bytes(bytes: &[u8]) -> Result<(Self, &[u8]), Error>;

    /// Decodes a value which must consume the whole of `bytes`.
    fn from_slice(bytes: &[u8]) -> Result<Self, Error> {
        let (value, remainder) = Self::from_bytes(bytes)?;
        if remainder.is_empty() {
            Ok(value)
        } else {
            Err(Error::Formatting)
        }
    }
}

/// Splits `n` bytes off the front of `bytes`.
pub fn safe_split_at(bytes: &[u8], n: usize) -> Result<(&[u8], &[u8]), Error> {
    if n > bytes.len() {
        Err(Error::EarlyEndOfStream)
    } else {
        Ok(bytes.split_at(n))
    }
}

impl ToBytes for u32 {
    fn write_bytes(&self, writer: &mut Vec<u8>) {
        writer.extend_from_slice(&self.to_be_bytes());
    }
}

impl FromBytes for u32 {
    fn from_bytes(bytes: &[u8]) -> Result<(Self, &[u8]), Error> {
        let (front, remainder) = safe_split_at(bytes, U32_SERIALIZED_LENGTH)?;
        let mut raw = [0u8; U32_SERIALIZED_LENGTH];
        raw.copy_from_slice(front);
        Ok((u32::from_be_bytes(raw), remainder))
    }
}

impl ToBytes for Vec<u8> {
    fn write_bytes(&self, writer: &mut Vec<u8>) {
        (self.len() as u32).write_bytes(writer);
        writer.extend_from_slice(self);
    }
}

impl FromBytes for Vec<u8> {
    fn from_bytes(bytes: &[u8]) -> Result<(Self, &[u8]), Error> {
        let (len, remainder) = u32::from_bytes(bytes)?;
        let (front, remainder) = safe_split_at(remainder, len as usize)?;
        Ok((front.to_vec(), remainder))
    }
}

impl<T: ToBytes> ToBytes for Vec<T> {
    fn write_bytes(&self, writer: &mut Vec<u8>) {
        (self.len() as u32).write_bytes(writer);
        for item in self {
            item.write_bytes(writer);
        }
    }
}

impl<T: FromBytes> FromBytes for Vec<T> {
    fn from_bytes(bytes: &[u8]) -> Result<(Self, &[u8]), Error> {
        let (count, mut remainder) = u32::from_bytes(bytes)?;
        let mut result = Vec::new();
        for _ in 0..count {
            let (item, rest) = T::from_bytes(remainder)?;
            result.push(item);
            remainder = rest;
        }
        Ok((result, remainder))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u32_round_trip_is_big_endian() {
        let bytes = 0x0102_0304_u32.to_bytes();
        assert_eq!(bytes, vec![1, 2, 3, 4]);
        assert_eq!(u32::from_slice(&bytes).unwrap(), 0x0102_0304);
    }

    #[test]
    fn byte_vec_is_length_prefixed() {
        let bytes = vec![7u8, 8, 9].to_bytes();
        assert_eq!(bytes, vec![0, 0, 0, 3, 7, 8, 9]);
    }

    #[test]
    fn trailing_bytes_are_rejected_by_from_slice() {
        let mut bytes = 1u32.to_bytes();
        bytes.push(0xff);
        assert_eq!(u32::from_slice(&bytes), Err(Error::Formatting));
    }

    #[test]
    fn truncated_input_is_early_end_of_stream() {
        assert_eq!(u32::from_slice(&[0, 1]), Err(Error::EarlyEndOfStream));
        assert_eq!(
            <Vec<u8>>::from_slice(&[0, 0, 0, 5, 1, 2]),
            Err(Error::EarlyEndOfStream)
        );
    }
}
