//! A library providing the hash primitives used across the Tessera execution
//! core: SHA-256 for commitment digests and Keccak-256 for content addressing.

#![doc(html_root_url = "https://docs.rs/tessera-hashing/0.1.0")]
#![warn(missing_docs)]

use std::{
    array::TryFromSliceError,
    convert::TryFrom,
    fmt::{self, Debug, Display, Formatter, LowerHex, UpperHex},
};

use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};
use sha3::Keccak256;

/// The output of a hash function; a wrapped `u8` array.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Default, Serialize, Deserialize)]
pub struct Digest([u8; Digest::LENGTH]);

impl Digest {
    /// The number of bytes in a digest.
    pub const LENGTH: usize = 32;

    /// Returns the SHA-256 hash of `data`.
    pub fn sha256<T: AsRef<[u8]>>(data: T) -> Digest {
        Digest(Sha256::digest(data.as_ref()).into())
    }

    /// Returns the Keccak-256 hash of `data`.
    pub fn keccak256<T: AsRef<[u8]>>(data: T) -> Digest {
        Digest(Keccak256::digest(data.as_ref()).into())
    }

    /// Returns a copy of the wrapped byte array.
    pub fn value(&self) -> [u8; Digest::LENGTH] {
        self.0
    }

    /// Returns a reference to the wrapped bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; Digest::LENGTH]> for Digest {
    fn from(bytes: [u8; Digest::LENGTH]) -> Self {
        Digest(bytes)
    }
}

impl From<Digest> for [u8; Digest::LENGTH] {
    fn from(digest: Digest) -> Self {
        digest.0
    }
}

impl TryFrom<&[u8]> for Digest {
    type Error = TryFromSliceError;

    fn try_from(slice: &[u8]) -> Result<Digest, Self::Error> {
        <[u8; Digest::LENGTH]>::try_from(slice).map(Digest)
    }
}

impl LowerHex for Digest {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", base16::encode_lower(&self.0))
    }
}

impl UpperHex for Digest {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", base16::encode_upper(&self.0))
    }
}

impl Display for Digest {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{:x}", self)
    }
}

impl Debug for Digest {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "Digest({:x})", self)
    }
}
