//! Types shared by the Tessera execution core: addresses, versions, the
//! effect-set dependency log, contract records, events, and the deterministic
//! binary codec their wire forms are built on.

#![doc(html_root_url = "https://docs.rs/tessera-types/0.1.0")]
#![warn(missing_docs)]

mod address;
mod args;
mod contract;
mod effects;
pub mod encoding;
mod event;
mod key;
mod version;

pub use address::Address;
pub use args::Args;
pub use contract::{address_for_code, Contract};
pub use effects::{AddressEffect, BlockEffects, EffectSet, ReadRecord, WriteRecord};
pub use event::{
    ContractEvent, Event, EventError, MAX_EVENT_NAME_LENGTH, MAX_EVENT_VALUE_LENGTH,
};
pub use key::Key;
pub use version::{StoredValue, Version};
