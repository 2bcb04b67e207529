use serde::{Deserialize, Serialize};

use tessera_hashing::Digest;

use crate::{
    encoding::{self, FromBytes},
    Address,
};

/// A deployed contract: its owner and the sandbox bytecode. The contract's
/// address is content-derived, so identical code always lands at the same
/// address.
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct Contract {
    /// The account that deployed the contract.
    pub owner: Address,
    /// The contract bytecode.
    pub code: Vec<u8>,
}

impl Contract {
    /// Constructs a new `Contract`.
    pub fn new(owner: Address, code: Vec<u8>) -> Self {
        Contract { owner, code }
    }

    /// Returns the content address: the trailing 20 bytes of the Keccak-256
    /// hash of the code.
    pub fn address(&self) -> Address {
        address_for_code(&self.code)
    }

    /// Returns the durable encoding: `owner ‖ code`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = Vec::with_capacity(Address::LENGTH + self.code.len());
        writer.extend_from_slice(self.owner.as_bytes());
        writer.extend_from_slice(&self.code);
        writer
    }

    /// Decodes a durable encoding.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, encoding::Error> {
        let (owner, code) = Address::from_bytes(bytes)?;
        Ok(Contract {
            owner,
            code: code.to_vec(),
        })
    }
}

/// Derives the content address for contract code.
pub fn address_for_code(code: &[u8]) -> Address {
    let digest = Digest::keccak256(code);
    let mut raw = [0u8; Address::LENGTH];
    raw.copy_from_slice(&digest.as_bytes()[Digest::LENGTH - Address::LENGTH..]);
    Address::new(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let contract = Contract::new(Address::new([9; 20]), vec![0, 97, 115, 109]);
        assert_eq!(Contract::from_slice(&contract.to_bytes()).unwrap(), contract);
    }

    #[test]
    fn address_depends_on_code_not_owner() {
        let a = Contract::new(Address::new([1; 20]), b"code".to_vec());
        let b = Contract::new(Address::new([2; 20]), b"code".to_vec());
        let c = Contract::new(Address::new([1; 20]), b"other".to_vec());
        assert_eq!(a.address(), b.address());
        assert_ne!(a.address(), c.address());
    }

    #[test]
    fn address_is_trailing_bytes_of_keccak() {
        let code = b"code";
        let digest = Digest::keccak256(code);
        assert_eq!(
            address_for_code(code).as_bytes(),
            &digest.as_bytes()[12..32]
        );
    }
}
