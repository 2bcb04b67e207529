use thiserror::Error;

use tessera_types::encoding;

/// Errors raised by reads of the versioned store.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// The key is not present in the durable store. Contracts cannot
    /// distinguish an absent key from an empty value unless they encode that
    /// themselves.
    #[error("key not found")]
    KeyNotFound,
    /// A durably stored value failed to decode.
    #[error("invalid stored value: {0}")]
    InvalidStoredValue(#[from] encoding::Error),
}
