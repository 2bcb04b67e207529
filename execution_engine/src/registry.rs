//! The registry of deployed contracts.

use std::{cell::RefCell, rc::Rc};

use tracing::debug;

use tessera_state::{StateReader, StateStore};
use tessera_types::{Address, Contract, Key};

use crate::error::Error;

/// Looks up and stores contract records in the durable store, keyed by their
/// content addresses.
pub struct ContractRegistry<S> {
    state: Rc<RefCell<S>>,
}

impl<S> Clone for ContractRegistry<S> {
    fn clone(&self) -> Self {
        ContractRegistry {
            state: Rc::clone(&self.state),
        }
    }
}

impl<S: StateReader> ContractRegistry<S> {
    /// Constructs a registry over the shared global state.
    pub fn new(state: Rc<RefCell<S>>) -> Self {
        ContractRegistry { state }
    }

    /// Returns the contract deployed at `address`.
    pub fn get(&self, address: Address) -> Result<Contract, Error> {
        let raw = self
            .state
            .borrow()
            .read(&Key::Contract(address).to_bytes())
            .ok_or(Error::ContractNotFound(address))?;
        Ok(Contract::from_slice(&raw)?)
    }
}

impl<S: StateStore> ContractRegistry<S> {
    /// Deploys `code` under its content address. Since the address is
    /// derived from the code alone, redeploying identical code is rejected.
    pub fn deploy(&self, owner: Address, code: Vec<u8>) -> Result<Address, Error> {
        let contract = Contract::new(owner, code);
        let address = contract.address();
        match self.get(address) {
            Ok(_) => Err(Error::ContractAlreadyExists(address)),
            Err(Error::ContractNotFound(_)) => {
                self.state
                    .borrow_mut()
                    .write(Key::Contract(address).to_bytes(), contract.to_bytes());
                debug!(%address, owner = %contract.owner, "deployed contract");
                Ok(address)
            }
            Err(error) => Err(error),
        }
    }
}
