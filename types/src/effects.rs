//! The read/write dependency log produced by contract invocations.

use serde::{Deserialize, Serialize};

use tessera_hashing::Digest;

use crate::{
    encoding::{self, FromBytes, ToBytes},
    Address, Version,
};

/// A key read by an invocation, with the version observed at first access.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub struct ReadRecord {
    /// The key that was read.
    pub key: Vec<u8>,
    /// The version observed at the moment of the first read.
    pub version: Version,
}

impl ToBytes for ReadRecord {
    fn write_bytes(&self, writer: &mut Vec<u8>) {
        self.key.write_bytes(writer);
        self.version.write_bytes(writer);
    }
}

impl FromBytes for ReadRecord {
    fn from_bytes(bytes: &[u8]) -> Result<(Self, &[u8]), encoding::Error> {
        let (key, remainder) = Vec::<u8>::from_bytes(bytes)?;
        let (version, remainder) = Version::from_bytes(remainder)?;
        Ok((ReadRecord { key, version }, remainder))
    }
}

/// A key written by an invocation, with its final buffered value.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub struct WriteRecord {
    /// The key that was written.
    pub key: Vec<u8>,
    /// The last value written under the key.
    pub value: Vec<u8>,
}

impl ToBytes for WriteRecord {
    fn write_bytes(&self, writer: &mut Vec<u8>) {
        self.key.write_bytes(writer);
        self.value.write_bytes(writer);
    }
}

impl FromBytes for WriteRecord {
    fn from_bytes(bytes: &[u8]) -> Result<(Self, &[u8]), encoding::Error> {
        let (key, remainder) = Vec::<u8>::from_bytes(bytes)?;
        let (value, remainder) = Vec::<u8>::from_bytes(remainder)?;
        Ok((WriteRecord { key, value }, remainder))
    }
}

/// The full dependency/mutation log of one invocation. Read records appear in
/// first-access order, write records in first-write order with the latest
/// value for each key.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Default, Serialize, Deserialize)]
pub struct EffectSet {
    /// Keys read, in first-access order.
    pub read_records: Vec<ReadRecord>,
    /// Keys written, in first-write order.
    pub write_records: Vec<WriteRecord>,
}

impl EffectSet {
    /// Returns `true` if neither reads nor writes were recorded.
    pub fn is_empty(&self) -> bool {
        self.read_records.is_empty() && self.write_records.is_empty()
    }
}

impl ToBytes for EffectSet {
    fn write_bytes(&self, writer: &mut Vec<u8>) {
        self.read_records.write_bytes(writer);
        self.write_records.write_bytes(writer);
    }
}

impl FromBytes for EffectSet {
    fn from_bytes(bytes: &[u8]) -> Result<(Self, &[u8]), encoding::Error> {
        let (read_records, remainder) = Vec::<ReadRecord>::from_bytes(bytes)?;
        let (write_records, remainder) = Vec::<WriteRecord>::from_bytes(remainder)?;
        Ok((
            EffectSet {
                read_records,
                write_records,
            },
            remainder,
        ))
    }
}

/// An [`EffectSet`] scoped to one contract's key namespace.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub struct AddressEffect {
    /// The contract whose namespace the effect set belongs to.
    pub address: Address,
    /// The invocation's dependency log.
    pub effect_set: EffectSet,
}

impl ToBytes for AddressEffect {
    fn write_bytes(&self, writer: &mut Vec<u8>) {
        self.address.write_bytes(writer);
        self.effect_set.write_bytes(writer);
    }
}

impl FromBytes for AddressEffect {
    fn from_bytes(bytes: &[u8]) -> Result<(Self, &[u8]), encoding::Error> {
        let (address, remainder) = Address::from_bytes(bytes)?;
        let (effect_set, remainder) = EffectSet::from_bytes(remainder)?;
        Ok((
            AddressEffect {
                address,
                effect_set,
            },
            remainder,
        ))
    }
}

/// The ordered effect sets produced while executing a block (or a single
/// top-level invocation together with its nested calls). Nested calls appear
/// before their caller's own effect set, i.e. in post-order.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Default, Serialize, Deserialize)]
pub struct BlockEffects(Vec<AddressEffect>);

impl BlockEffects {
    /// Constructs an empty `BlockEffects`.
    pub fn new() -> Self {
        BlockEffects::default()
    }

    /// Appends an effect set.
    pub fn push(&mut self, effect: AddressEffect) {
        self.0.push(effect);
    }

    /// Appends all effect sets of `other`, preserving their order.
    pub fn append(&mut self, other: BlockEffects) {
        self.0.extend(other.0);
    }

    /// Returns the number of effect sets.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no effect sets are present.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates the effect sets in invocation order.
    pub fn iter(&self) -> impl Iterator<Item = &AddressEffect> {
        self.0.iter()
    }

    /// Returns the commitment digest: the SHA-256 hash of the deterministic
    /// encoding. Two nodes producing the same effects produce the same
    /// digest.
    pub fn commitment(&self) -> Digest {
        Digest::sha256(self.to_bytes())
    }
}

impl From<Vec<AddressEffect>> for BlockEffects {
    fn from(effects: Vec<AddressEffect>) -> Self {
        BlockEffects(effects)
    }
}

impl IntoIterator for BlockEffects {
    type Item = AddressEffect;
    type IntoIter = std::vec::IntoIter<AddressEffect>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl ToBytes for BlockEffects {
    fn write_bytes(&self, writer: &mut Vec<u8>) {
        self.0.write_bytes(writer);
    }
}

impl FromBytes for BlockEffects {
    fn from_bytes(bytes: &[u8]) -> Result<(Self, &[u8]), encoding::Error> {
        let (effects, remainder) = Vec::<AddressEffect>::from_bytes(bytes)?;
        Ok((BlockEffects(effects), remainder))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> BlockEffects {
        BlockEffects::from(vec![
            AddressEffect {
                address: Address::new([1; 20]),
                effect_set: EffectSet {
                    read_records: vec![ReadRecord {
                        key: b"balance".to_vec(),
                        version: Version::new(4, 2),
                    }],
                    write_records: vec![WriteRecord {
                        key: b"balance".to_vec(),
                        value: b"100".to_vec(),
                    }],
                },
            },
            AddressEffect {
                address: Address::new([2; 20]),
                effect_set: EffectSet::default(),
            },
        ])
    }

    #[test]
    fn round_trip() {
        let effects = sample();
        assert_eq!(BlockEffects::from_slice(&effects.to_bytes()).unwrap(), effects);
    }

    #[test]
    fn commitment_is_stable_and_content_sensitive() {
        let effects = sample();
        assert_eq!(effects.commitment(), sample().commitment());

        let mut reordered: Vec<AddressEffect> = sample().into_iter().collect();
        reordered.reverse();
        assert_ne!(effects.commitment(), BlockEffects::from(reordered).commitment());
    }

    #[test]
    fn empty_effect_set_is_empty() {
        assert!(EffectSet::default().is_empty());
        assert!(!sample().iter().next().unwrap().effect_set.is_empty());
    }
}
