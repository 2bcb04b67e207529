use std::fmt::{self, Debug, Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::encoding::{self, safe_split_at, FromBytes, ToBytes};

/// A 20-byte account or contract address.
#[derive(
    Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Default, Serialize, Deserialize,
)]
pub struct Address([u8; Address::LENGTH]);

impl Address {
    /// The number of bytes in an address.
    pub const LENGTH: usize = 20;

    /// Constructs an address from a byte array.
    pub const fn new(bytes: [u8; Address::LENGTH]) -> Self {
        Address(bytes)
    }

    /// Returns a reference to the wrapped bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns a copy of the wrapped byte array.
    pub fn value(&self) -> [u8; Address::LENGTH] {
        self.0
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; Address::LENGTH]> for Address {
    fn from(bytes: [u8; Address::LENGTH]) -> Self {
        Address(bytes)
    }
}

impl TryFrom<&[u8]> for Address {
    type Error = encoding::Error;

    fn try_from(slice: &[u8]) -> Result<Self, Self::Error> {
        <[u8; Address::LENGTH]>::try_from(slice)
            .map(Address)
            .map_err(|_| encoding::Error::Formatting)
    }
}

impl ToBytes for Address {
    fn write_bytes(&self, writer: &mut Vec<u8>) {
        writer.extend_from_slice(&self.0);
    }
}

impl FromBytes for Address {
    fn from_bytes(bytes: &[u8]) -> Result<(Self, &[u8]), encoding::Error> {
        let (front, remainder) = safe_split_at(bytes, Address::LENGTH)?;
        let mut raw = [0u8; Address::LENGTH];
        raw.copy_from_slice(front);
        Ok((Address(raw), remainder))
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "0x{}", base16::encode_lower(&self.0))
    }
}

impl Debug for Address {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}
