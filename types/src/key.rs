use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::{encoding::ToBytes, Address};

/// The closed set of keyspaces in the durable store. Every raw store key is
/// the encoding of exactly one `Key`, which keeps contract records and
/// per-contract state in disjoint, address-scoped namespaces.
#[derive(Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub enum Key {
    /// A deployed contract record, keyed by its content address.
    Contract(Address),
    /// A contract-local state entry.
    State {
        /// The contract whose namespace the entry belongs to.
        address: Address,
        /// The contract-chosen key within that namespace.
        path: Vec<u8>,
    },
}

const CONTRACT_TAG: u8 = 0;
const STATE_TAG: u8 = 1;

impl Key {
    /// Returns the raw store key: `tag ‖ address ‖ path`.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Key::Contract(address) => {
                let mut writer = Vec::with_capacity(1 + Address::LENGTH);
                writer.push(CONTRACT_TAG);
                address.write_bytes(&mut writer);
                writer
            }
            Key::State { address, path } => {
                let mut writer = Vec::with_capacity(1 + Address::LENGTH + path.len());
                writer.push(STATE_TAG);
                address.write_bytes(&mut writer);
                writer.extend_from_slice(path);
                writer
            }
        }
    }
}

impl Display for Key {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Key::Contract(address) => write!(f, "Key::Contract({})", address),
            Key::State { address, path } => write!(
                f,
                "Key::State({}, {})",
                address,
                base16::encode_lower(path)
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespaces_are_disjoint() {
        let address = Address::new([7; 20]);
        let contract = Key::Contract(address).to_bytes();
        let state = Key::State {
            address,
            path: Vec::new(),
        }
        .to_bytes();
        assert_ne!(contract, state);
    }

    #[test]
    fn state_keys_are_address_prefixed() {
        let a = Key::State {
            address: Address::new([1; 20]),
            path: b"k".to_vec(),
        };
        let b = Key::State {
            address: Address::new([2; 20]),
            path: b"k".to_vec(),
        };
        assert_ne!(a.to_bytes(), b.to_bytes());
        assert!(a.to_bytes().starts_with(&[1, 1, 1]));
    }
}
