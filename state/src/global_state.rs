//! The raw durable key-value store underneath the versioned layer.

use std::collections::BTreeMap;

/// Read access to the raw store.
pub trait StateReader {
    /// Returns the raw bytes stored under `key`, if any.
    fn read(&self, key: &[u8]) -> Option<Vec<u8>>;
}

/// Read/write access to the raw store.
pub trait StateStore: StateReader {
    /// Stores `value` under `key`, replacing any previous value.
    fn write(&mut self, key: Vec<u8>, value: Vec<u8>);
}

/// An in-memory global state, used in tests and for simulation. The store is
/// assumed to be exclusively owned by the single block being processed; no
/// locking happens at this layer.
#[derive(Clone, Debug, Default)]
pub struct InMemoryGlobalState {
    data: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl InMemoryGlobalState {
    /// Constructs an empty state.
    pub fn new() -> Self {
        InMemoryGlobalState::default()
    }

    /// Returns the number of stored entries.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl StateReader for InMemoryGlobalState {
    fn read(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.data.get(key).cloned()
    }
}

impl StateStore for InMemoryGlobalState {
    fn write(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.data.insert(key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read() {
        let mut state = InMemoryGlobalState::new();
        assert!(state.read(b"missing").is_none());
        state.write(b"k".to_vec(), b"v".to_vec());
        assert_eq!(state.read(b"k"), Some(b"v".to_vec()));
    }

    #[test]
    fn overwrite_replaces() {
        let mut state = InMemoryGlobalState::new();
        state.write(b"k".to_vec(), b"a".to_vec());
        state.write(b"k".to_vec(), b"b".to_vec());
        assert_eq!(state.read(b"k"), Some(b"b".to_vec()));
        assert_eq!(state.len(), 1);
    }
}
