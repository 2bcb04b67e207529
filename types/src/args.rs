use serde::{Deserialize, Serialize};

use crate::encoding::{self, FromBytes, ToBytes};

/// An ordered, immutable list of opaque byte strings passed to a contract
/// entry point.
///
/// The wire form, used for nested contract calls, is `count:u32 BE` followed
/// by `len:u32 BE ‖ bytes` for each element.
#[derive(Clone, Eq, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct Args(Vec<Vec<u8>>);

impl Args {
    /// Constructs an empty argument list.
    pub fn new() -> Self {
        Args::default()
    }

    /// Returns the number of arguments.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no arguments are present.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the argument at `index`, if present.
    pub fn get(&self, index: usize) -> Option<&[u8]> {
        self.0.get(index).map(Vec::as_slice)
    }

    /// Appends a byte-string argument.
    pub fn push_bytes<T: Into<Vec<u8>>>(&mut self, bytes: T) {
        self.0.push(bytes.into());
    }

    /// Appends a UTF-8 string argument.
    pub fn push_str<T: AsRef<str>>(&mut self, value: T) {
        self.0.push(value.as_ref().as_bytes().to_vec());
    }
}

impl From<Vec<Vec<u8>>> for Args {
    fn from(values: Vec<Vec<u8>>) -> Self {
        Args(values)
    }
}

impl<'a> From<&'a [&'a str]> for Args {
    fn from(values: &'a [&'a str]) -> Self {
        Args(values.iter().map(|s| s.as_bytes().to_vec()).collect())
    }
}

impl ToBytes for Args {
    fn write_bytes(&self, writer: &mut Vec<u8>) {
        self.0.write_bytes(writer);
    }
}

impl FromBytes for Args {
    fn from_bytes(bytes: &[u8]) -> Result<(Self, &[u8]), encoding::Error> {
        let (values, remainder) = Vec::<Vec<u8>>::from_bytes(bytes)?;
        Ok((Args(values), remainder))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_form_is_count_then_length_prefixed_elements() {
        let mut args = Args::new();
        args.push_str("to");
        args.push_bytes(vec![0xff]);
        assert_eq!(
            args.to_bytes(),
            vec![0, 0, 0, 2, 0, 0, 0, 2, b't', b'o', 0, 0, 0, 1, 0xff]
        );
    }

    #[test]
    fn round_trip() {
        let args = Args::from(vec![b"a".to_vec(), Vec::new(), b"ccc".to_vec()]);
        assert_eq!(Args::from_slice(&args.to_bytes()).unwrap(), args);
    }

    #[test]
    fn out_of_range_get_is_none() {
        let args = Args::from(&["only"][..]);
        assert_eq!(args.get(0), Some(&b"only"[..]));
        assert_eq!(args.get(1), None);
    }

    #[test]
    fn malformed_wire_form_is_rejected() {
        // Claims two elements but carries only one.
        let bytes = vec![0, 0, 0, 2, 0, 0, 0, 1, b'x'];
        assert!(Args::from_slice(&bytes).is_err());
    }
}
