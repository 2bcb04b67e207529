use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::encoding::{self, safe_split_at, FromBytes, ToBytes};

/// The position at which a value was committed: block height plus the
/// position of the writing invocation within that block. Totally ordered,
/// `(height, sequence)` lexicographically.
#[derive(
    Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Default, Serialize, Deserialize,
)]
pub struct Version {
    /// Block height.
    pub height: u32,
    /// Position of the invocation within the block.
    pub sequence: u32,
}

impl Version {
    /// The number of bytes in a serialized version.
    pub const SERIALIZED_LENGTH: usize = 8;

    /// Constructs a new `Version`.
    pub const fn new(height: u32, sequence: u32) -> Self {
        Version { height, sequence }
    }
}

impl ToBytes for Version {
    fn write_bytes(&self, writer: &mut Vec<u8>) {
        writer.extend_from_slice(&self.height.to_be_bytes());
        writer.extend_from_slice(&self.sequence.to_be_bytes());
    }
}

impl FromBytes for Version {
    fn from_bytes(bytes: &[u8]) -> Result<(Self, &[u8]), encoding::Error> {
        let (front, remainder) = safe_split_at(bytes, Version::SERIALIZED_LENGTH)?;
        let mut raw = [0u8; 4];
        raw.copy_from_slice(&front[..4]);
        let height = u32::from_be_bytes(raw);
        raw.copy_from_slice(&front[4..]);
        let sequence = u32::from_be_bytes(raw);
        Ok((Version { height, sequence }, remainder))
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}.{}", self.height, self.sequence)
    }
}

/// A raw value together with the version at which it was committed. The
/// durable encoding is the value bytes followed by the 8-byte version.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Default, Serialize, Deserialize)]
pub struct StoredValue {
    /// The stored bytes.
    pub value: Vec<u8>,
    /// The version stamped at commit time.
    pub version: Version,
}

impl StoredValue {
    /// Constructs a new `StoredValue`.
    pub fn new(value: Vec<u8>, version: Version) -> Self {
        StoredValue { value, version }
    }

    /// Returns the durable encoding: `value ‖ version`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = Vec::with_capacity(self.value.len() + Version::SERIALIZED_LENGTH);
        writer.extend_from_slice(&self.value);
        self.version.write_bytes(&mut writer);
        writer
    }

    /// Decodes a durable encoding by splitting off the trailing version.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, encoding::Error> {
        if bytes.len() < Version::SERIALIZED_LENGTH {
            return Err(encoding::Error::EarlyEndOfStream);
        }
        let split = bytes.len() - Version::SERIALIZED_LENGTH;
        let (value, version_bytes) = bytes.split_at(split);
        let version = Version::from_slice(version_bytes)?;
        Ok(StoredValue {
            value: value.to_vec(),
            version,
        })
    }
}
