//! Optimistic-concurrency validation and application of a block's effect
//! sets.

use std::{
    collections::{HashMap, HashSet},
    fmt::{self, Display, Formatter},
};

use thiserror::Error;
use tracing::{debug, warn};

use tessera_types::{Address, BlockEffects, Key, StoredValue, Version};

use crate::global_state::StateStore;

/// Whether a rejected access was the invocation's read or write.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AccessKind {
    /// A read that observed a key an earlier invocation in the block wrote.
    Read,
    /// A write to a key an earlier invocation in the block observed.
    Write,
}

impl Display for AccessKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            AccessKind::Read => write!(f, "read"),
            AccessKind::Write => write!(f, "write"),
        }
    }
}

/// Rejection of a block commit.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
#[non_exhaustive]
pub enum CommitError {
    /// An invocation's recorded reads/writes are inconsistent with effects
    /// applied earlier in the same block.
    #[error("conflicting updates in block: address={address} key=0x{} ({access})", base16::encode_lower(.key))]
    Conflict {
        /// The contract namespace in which the conflict occurred.
        address: Address,
        /// The conflicting key.
        key: Vec<u8>,
        /// The access of the rejected invocation that clashed.
        access: AccessKind,
    },
}

/// Per-address key sets accumulated while committing a block. One tracker is
/// used per address for the whole block and reset (recreated) at the next
/// block.
#[derive(Debug, Default)]
pub struct ConflictTracker {
    read_keys: HashSet<Vec<u8>>,
    written_keys: HashSet<Vec<u8>>,
}

/// Validates and applies a block's effect sets, in invocation order, against
/// one fresh [`ConflictTracker`] per address.
///
/// An invocation is rejected if any of its reads hits a key an earlier
/// invocation wrote, or any of its writes hits a key an earlier invocation
/// read. Writes are staged in memory while validating and flushed to `state`
/// only once every invocation in the block has passed, so a rejected block
/// leaves the durable store untouched.
///
/// This validator re-checks effects recorded earlier (e.g. during
/// simulation) against the block's actual interleaving; it never re-runs the
/// VM. It must agree with a purely sequential re-execution.
pub fn commit_block<S: StateStore>(
    state: &mut S,
    effects: &BlockEffects,
    version: Version,
) -> Result<(), CommitError> {
    let mut trackers: HashMap<Address, ConflictTracker> = HashMap::new();
    let mut staged: Vec<(Vec<u8>, Vec<u8>)> = Vec::new();

    for effect in effects.iter() {
        let tracker = trackers.entry(effect.address).or_default();

        for read in &effect.effect_set.read_records {
            if tracker.written_keys.contains(&read.key) {
                warn!(
                    address = %effect.address,
                    key = %base16::encode_lower(&read.key),
                    "stale read of a key written earlier in the block"
                );
                return Err(CommitError::Conflict {
                    address: effect.address,
                    key: read.key.clone(),
                    access: AccessKind::Read,
                });
            }
        }
        for write in &effect.effect_set.write_records {
            if tracker.read_keys.contains(&write.key) {
                warn!(
                    address = %effect.address,
                    key = %base16::encode_lower(&write.key),
                    "write would invalidate a read made earlier in the block"
                );
                return Err(CommitError::Conflict {
                    address: effect.address,
                    key: write.key.clone(),
                    access: AccessKind::Write,
                });
            }
        }

        for write in &effect.effect_set.write_records {
            let raw_key = Key::State {
                address: effect.address,
                path: write.key.clone(),
            }
            .to_bytes();
            let stored = StoredValue::new(write.value.clone(), version);
            staged.push((raw_key, stored.to_bytes()));
        }

        for read in &effect.effect_set.read_records {
            tracker.read_keys.insert(read.key.clone());
        }
        for write in &effect.effect_set.write_records {
            tracker.written_keys.insert(write.key.clone());
        }
    }

    debug!(
        effect_sets = effects.len(),
        writes = staged.len(),
        %version,
        "committing block effects"
    );
    for (key, value) in staged {
        state.write(key, value);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::global_state::{InMemoryGlobalState, StateReader};
    use tessera_types::{AddressEffect, EffectSet, ReadRecord, WriteRecord};

    const ADDR_A: Address = Address::new([1; 20]);
    const ADDR_B: Address = Address::new([2; 20]);

    fn effect(
        address: Address,
        reads: &[&[u8]],
        writes: &[(&[u8], &[u8])],
    ) -> AddressEffect {
        AddressEffect {
            address,
            effect_set: EffectSet {
                read_records: reads
                    .iter()
                    .map(|key| ReadRecord {
                        key: key.to_vec(),
                        version: Version::new(1, 0),
                    })
                    .collect(),
                write_records: writes
                    .iter()
                    .map(|(key, value)| WriteRecord {
                        key: key.to_vec(),
                        value: value.to_vec(),
                    })
                    .collect(),
            },
        }
    }

    #[test]
    fn disjoint_keys_commit() {
        let mut state = InMemoryGlobalState::new();
        let effects = BlockEffects::from(vec![
            effect(ADDR_A, &[b"a1"], &[(b"b1", b"v")]),
            effect(ADDR_A, &[b"a2"], &[]),
        ]);
        assert!(commit_block(&mut state, &effects, Version::new(2, 0)).is_ok());
    }

    #[test]
    fn read_after_write_conflicts() {
        let mut state = InMemoryGlobalState::new();
        let effects = BlockEffects::from(vec![
            effect(ADDR_A, &[b"a1"], &[(b"a1", b"v")]),
            effect(ADDR_A, &[b"a1"], &[]),
        ]);
        let error = commit_block(&mut state, &effects, Version::new(2, 0)).unwrap_err();
        assert_eq!(
            error,
            CommitError::Conflict {
                address: ADDR_A,
                key: b"a1".to_vec(),
                access: AccessKind::Read,
            }
        );
    }

    #[test]
    fn write_after_read_conflicts() {
        let mut state = InMemoryGlobalState::new();
        let effects = BlockEffects::from(vec![
            effect(ADDR_A, &[b"a1"], &[]),
            effect(ADDR_A, &[], &[(b"a1", b"v")]),
        ]);
        let error = commit_block(&mut state, &effects, Version::new(2, 0)).unwrap_err();
        assert_eq!(
            error,
            CommitError::Conflict {
                address: ADDR_A,
                key: b"a1".to_vec(),
                access: AccessKind::Write,
            }
        );
    }

    #[test]
    fn different_addresses_do_not_conflict() {
        let mut state = InMemoryGlobalState::new();
        let effects = BlockEffects::from(vec![
            effect(ADDR_A, &[b"a1"], &[(b"a1", b"v")]),
            effect(ADDR_B, &[b"a1"], &[(b"a1", b"v")]),
        ]);
        assert!(commit_block(&mut state, &effects, Version::new(2, 0)).is_ok());
    }

    #[test]
    fn writes_are_stamped_with_the_commit_version() {
        let mut state = InMemoryGlobalState::new();
        let version = Version::new(9, 4);
        let effects = BlockEffects::from(vec![effect(ADDR_A, &[], &[(b"k", b"v")])]);
        commit_block(&mut state, &effects, version).unwrap();

        let raw_key = Key::State {
            address: ADDR_A,
            path: b"k".to_vec(),
        }
        .to_bytes();
        let stored = StoredValue::from_slice(&state.read(&raw_key).unwrap()).unwrap();
        assert_eq!(stored.value, b"v");
        assert_eq!(stored.version, version);
    }

    #[test]
    fn rejected_block_leaves_the_store_untouched() {
        let mut state = InMemoryGlobalState::new();
        let effects = BlockEffects::from(vec![
            effect(ADDR_A, &[], &[(b"k", b"v")]),
            effect(ADDR_A, &[], &[(b"j", b"w")]),
            // Conflicts with the first invocation's write.
            effect(ADDR_A, &[b"k"], &[]),
        ]);
        assert!(commit_block(&mut state, &effects, Version::new(2, 0)).is_err());
        assert!(state.is_empty());
    }

    #[test]
    fn same_invocation_may_read_and_write_the_same_key() {
        // The checks apply across invocations, not within one.
        let mut state = InMemoryGlobalState::new();
        let effects = BlockEffects::from(vec![effect(ADDR_A, &[b"k"], &[(b"k", b"v")])]);
        assert!(commit_block(&mut state, &effects, Version::new(2, 0)).is_ok());
    }
}
