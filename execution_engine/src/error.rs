//! Execution errors.

use thiserror::Error;

use tessera_hashing::Digest;
use tessera_state as state;
use tessera_types::{encoding, Address, EventError};

use crate::crypto::CryptoError;

/// Errors which abort a contract invocation or reject its effects.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// WASM interpreter error, including traps raised inside the sandbox.
    #[error("interpreter error: {}", _0)]
    Interpreter(String),
    /// No contract is deployed at the address.
    #[error("contract not found: {}", _0)]
    ContractNotFound(Address),
    /// A contract with identical code is already deployed. Addresses are
    /// content-derived, so redeploying the same code lands on the same
    /// address.
    #[error("contract already exists: {}", _0)]
    ContractAlreadyExists(Address),
    /// The module does not export the requested entry point.
    #[error("entry point not found: {}", _0)]
    EntryPointNotFound(String),
    /// The entry point ran to completion but signalled failure with a
    /// negative status.
    #[error("contract exited with code {}", _0)]
    ExitCode(i32),
    /// The entry point did not return the expected i32 status.
    #[error("expected an i32 return value from the entry point")]
    ExpectedReturnValue,
    /// The module carries a start section, which is not supported.
    #[error("unsupported wasm start section")]
    UnsupportedWasmStart,
    /// The module neither imports nor exports a linear memory.
    #[error("no linear memory attached to the module")]
    NoImportedMemory,
    /// A nested call targeted an address already on the call stack.
    #[error("reentrant call into {}", _0)]
    ReentrantCall(Address),
    /// `exec` was invoked on an environment that already ran.
    #[error("environment is not in the created phase")]
    InvalidPhase,
    /// The declared effect-set commitment does not match the produced one.
    #[error("commitment mismatch: declared {declared} actual {actual}")]
    CommitmentMismatch {
        /// The digest the transaction declared.
        declared: Digest,
        /// The digest of the freshly produced effects.
        actual: Digest,
    },
    /// Versioned-store error.
    #[error("storage error: {}", _0)]
    Storage(#[from] state::Error),
    /// Failed to (de)serialize bytes.
    #[error("serialization error: {}", _0)]
    Encoding(#[from] encoding::Error),
    /// Event validation failure.
    #[error("event validation: {}", _0)]
    Event(#[from] EventError),
    /// Signature recovery failure.
    #[error("crypto error: {}", _0)]
    Crypto(#[from] CryptoError),
}

impl wasmi::HostError for Error {}

impl From<wasmi::Error> for Error {
    fn from(error: wasmi::Error) -> Self {
        match error
            .as_host_error()
            .and_then(|host_error| host_error.downcast_ref::<Error>())
        {
            Some(error) => error.clone(),
            None => Error::Interpreter(error.to_string()),
        }
    }
}
