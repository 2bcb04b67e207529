//! The per-invocation view of one contract's state namespace: durable reads
//! tagged with their versions, buffered writes, and the dependency log the
//! commit validator later checks.

use std::{cell::RefCell, collections::HashMap, rc::Rc};

use tessera_types::{
    Address, EffectSet, Key, ReadRecord, StoredValue, Version, WriteRecord,
};

use crate::{error::Error, global_state::StateReader};

/// The in-memory read/write log of one invocation.
///
/// Reads are recorded once per key, at first access, with the version
/// observed then; re-reads neither re-log nor change the recorded version.
/// Writes collapse per key to the latest value while keeping the position of
/// the first write.
#[derive(Debug, Default)]
struct RwLog {
    read_index: HashMap<Vec<u8>, usize>,
    reads: Vec<ReadRecord>,
    write_index: HashMap<Vec<u8>, usize>,
    writes: Vec<WriteRecord>,
}

impl RwLog {
    /// Records a read if `key` has not been read before. Returns `true` if a
    /// record was added.
    fn record_read(&mut self, key: &[u8], version: Version) -> bool {
        if self.read_index.contains_key(key) {
            return false;
        }
        self.reads.push(ReadRecord {
            key: key.to_vec(),
            version,
        });
        self.read_index.insert(key.to_vec(), self.reads.len() - 1);
        true
    }

    /// Records a write, replacing the value in place if `key` was written
    /// before.
    fn record_write(&mut self, key: &[u8], value: Vec<u8>) {
        match self.write_index.get(key) {
            Some(&index) => self.writes[index].value = value,
            None => {
                self.writes.push(WriteRecord {
                    key: key.to_vec(),
                    value,
                });
                self.write_index.insert(key.to_vec(), self.writes.len() - 1);
            }
        }
    }

    fn effect_set(&self) -> EffectSet {
        EffectSet {
            read_records: self.reads.clone(),
            write_records: self.writes.clone(),
        }
    }
}

/// A handle on the durable store, namespaced to one contract address, which
/// tracks the reads and writes of a single invocation.
///
/// Writes never touch the durable store, and reads never see the invocation's
/// own buffered writes: a read always observes the durable, pre-invocation
/// value.
#[derive(Debug)]
pub struct VersionedStore<S> {
    global: Rc<RefCell<S>>,
    address: Address,
    log: RwLog,
}

impl<S: StateReader> VersionedStore<S> {
    /// Constructs a store view over `global`, scoped to `address`'s
    /// namespace.
    pub fn new(global: Rc<RefCell<S>>, address: Address) -> Self {
        VersionedStore {
            global,
            address,
            log: RwLog::default(),
        }
    }

    /// Returns the address this view is scoped to.
    pub fn address(&self) -> Address {
        self.address
    }

    fn raw_key(&self, key: &[u8]) -> Vec<u8> {
        Key::State {
            address: self.address,
            path: key.to_vec(),
        }
        .to_bytes()
    }

    /// Looks up `key` in the durable namespaced store without logging.
    pub fn get(&self, key: &[u8]) -> Result<StoredValue, Error> {
        let raw = self
            .global
            .borrow()
            .read(&self.raw_key(key))
            .ok_or(Error::KeyNotFound)?;
        Ok(StoredValue::from_slice(&raw)?)
    }

    /// Looks up `key` and logs the observed version if this is the first
    /// read of `key` within the invocation.
    pub fn get_tracked(&mut self, key: &[u8]) -> Result<Vec<u8>, Error> {
        let stored = self.get(key)?;
        self.log.record_read(key, stored.version);
        Ok(stored.value)
    }

    /// Buffers a write of `value` under `key`. The durable store is not
    /// touched; repeated writes to the same key collapse to one record.
    pub fn set_tracked(&mut self, key: &[u8], value: Vec<u8>) {
        self.log.record_write(key, value);
    }

    /// Returns a snapshot of the current read/write log. The log is not
    /// cleared; the execution environment decides when it is final.
    pub fn effect_set(&self) -> EffectSet {
        self.log.effect_set()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::global_state::{InMemoryGlobalState, StateStore};

    fn store_with(
        address: Address,
        entries: &[(&[u8], &[u8], Version)],
    ) -> VersionedStore<InMemoryGlobalState> {
        let mut global = InMemoryGlobalState::new();
        for (key, value, version) in entries {
            let raw_key = Key::State {
                address,
                path: key.to_vec(),
            }
            .to_bytes();
            global.write(raw_key, StoredValue::new(value.to_vec(), *version).to_bytes());
        }
        VersionedStore::new(Rc::new(RefCell::new(global)), address)
    }

    #[test]
    fn no_read_of_own_pending_write() {
        let mut store = store_with(Address::new([1; 20]), &[]);
        store.set_tracked(b"k", b"A".to_vec());
        assert_eq!(store.get_tracked(b"k"), Err(Error::KeyNotFound));
    }

    #[test]
    fn first_read_wins() {
        let address = Address::new([1; 20]);
        let mut store = store_with(address, &[(b"k", b"v", Version::new(3, 1))]);

        assert_eq!(store.get_tracked(b"k").unwrap(), b"v");
        assert_eq!(store.get_tracked(b"k").unwrap(), b"v");

        let effect_set = store.effect_set();
        assert_eq!(effect_set.read_records.len(), 1);
        assert_eq!(effect_set.read_records[0].key, b"k");
        assert_eq!(effect_set.read_records[0].version, Version::new(3, 1));
    }

    #[test]
    fn last_write_wins_with_stable_position() {
        let mut store = store_with(Address::new([1; 20]), &[]);
        store.set_tracked(b"k", b"A".to_vec());
        store.set_tracked(b"j", b"C".to_vec());
        store.set_tracked(b"k", b"D".to_vec());

        let effect_set = store.effect_set();
        assert_eq!(
            effect_set.write_records,
            vec![
                WriteRecord {
                    key: b"k".to_vec(),
                    value: b"D".to_vec(),
                },
                WriteRecord {
                    key: b"j".to_vec(),
                    value: b"C".to_vec(),
                },
            ]
        );
    }

    #[test]
    fn untracked_get_does_not_log() {
        let address = Address::new([1; 20]);
        let store = store_with(address, &[(b"k", b"v", Version::new(1, 0))]);
        assert_eq!(store.get(b"k").unwrap().value, b"v");
        assert!(store.effect_set().is_empty());
    }

    #[test]
    fn effect_set_snapshot_does_not_clear_the_log() {
        let mut store = store_with(Address::new([1; 20]), &[]);
        store.set_tracked(b"k", b"A".to_vec());
        assert_eq!(store.effect_set().write_records.len(), 1);
        assert_eq!(store.effect_set().write_records.len(), 1);
    }

    #[test]
    fn namespaces_are_isolated() {
        let address = Address::new([1; 20]);
        let other = Address::new([2; 20]);
        let mut global = InMemoryGlobalState::new();
        global.write(
            Key::State {
                address: other,
                path: b"k".to_vec(),
            }
            .to_bytes(),
            StoredValue::new(b"v".to_vec(), Version::new(1, 0)).to_bytes(),
        );
        let mut store = VersionedStore::new(Rc::new(RefCell::new(global)), address);
        assert_eq!(store.get_tracked(b"k"), Err(Error::KeyNotFound));
    }
}
