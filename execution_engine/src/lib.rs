//! The contract execution engine: a sandboxed WASM interpreter wired to the
//! host-function bridge, the contract registry and the versioned store.
//!
//! A [`Executor`] creates one [`Environment`] per invocation. The
//! environment instantiates the contract module, runs the requested entry
//! point and collects the response, the emitted events and the read/write
//! effects of the whole call tree. Effects are buffered, never applied;
//! committing them is the concern of `tessera-state`.

#![doc(html_root_url = "https://docs.rs/tessera-execution-engine/0.1.0")]
#![warn(missing_docs)]

pub mod crypto;
mod environment;
mod error;
mod function_index;
mod registry;
mod resolver;
mod runtime;

pub use environment::{
    verify_commitment, BlockContext, Environment, ExecutionOutcome, Executor,
};
pub use error::Error;
pub use registry::ContractRegistry;
pub use runtime::{RET_ERR, RET_KEY_NOT_FOUND, RET_OK};
