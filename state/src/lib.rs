//! The state layer of the Tessera execution core.
//!
//! A raw namespaced key-value store ([`StateStore`]) is wrapped by a
//! [`VersionedStore`]: every durably stored value carries the
//! `(height, sequence)` version at which it was written, and every
//! invocation-scoped view logs which keys it read (with the observed
//! version) and wrote (with the final buffered value). [`commit_block`]
//! validates the ordered effect sets of a whole block against per-address
//! [`ConflictTracker`]s and applies them atomically.

#![doc(html_root_url = "https://docs.rs/tessera-state/0.1.0")]
#![warn(missing_docs)]

mod commit;
mod error;
mod global_state;
mod versioned_store;

pub use commit::{commit_block, AccessKind, CommitError, ConflictTracker};
pub use error::Error;
pub use global_state::{InMemoryGlobalState, StateReader, StateStore};
pub use versioned_store::VersionedStore;
