//! Signature-recovery primitives exposed to contracts.

use k256::{
    ecdsa::{RecoveryId, Signature, VerifyingKey},
    elliptic_curve::sec1::ToEncodedPoint,
};
use thiserror::Error;

use tessera_hashing::Digest;
use tessera_types::Address;

/// The length of an uncompressed secp256k1 public key, SEC1 `0x04`-tagged.
pub const PUBLIC_KEY_LENGTH: usize = 65;

/// Signature-recovery error. Malformed parameter lengths are a hard error
/// rather than being padded or truncated.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
#[non_exhaustive]
pub enum CryptoError {
    /// A parameter has the wrong length.
    #[error("length of {parameter} should be {expected}, got {actual}")]
    InvalidLength {
        /// The offending parameter.
        parameter: &'static str,
        /// The required length.
        expected: usize,
        /// The length received.
        actual: usize,
    },
    /// The signature did not recover to a valid public key.
    #[error("failed to recover public key")]
    Recovery,
}

fn check_length(
    parameter: &'static str,
    expected: usize,
    bytes: &[u8],
) -> Result<(), CryptoError> {
    if bytes.len() != expected {
        return Err(CryptoError::InvalidLength {
            parameter,
            expected,
            actual: bytes.len(),
        });
    }
    Ok(())
}

/// Recovers the uncompressed secp256k1 public key which signed `hash` with
/// the recoverable signature `(v, r, s)`. `v` accepts both the raw recovery
/// id (0/1) and the Ethereum-style 27/28 form.
pub fn ecrecover(hash: &[u8], v: &[u8], r: &[u8], s: &[u8]) -> Result<[u8; PUBLIC_KEY_LENGTH], CryptoError> {
    check_length("h", 32, hash)?;
    check_length("v", 1, v)?;
    check_length("r", 32, r)?;
    check_length("s", 32, s)?;

    let recovery_byte = if v[0] >= 27 { v[0] - 27 } else { v[0] };
    let recovery_id = RecoveryId::from_byte(recovery_byte).ok_or(CryptoError::Recovery)?;

    let mut raw_signature = [0u8; 64];
    raw_signature[..32].copy_from_slice(r);
    raw_signature[32..].copy_from_slice(s);
    let signature = Signature::from_slice(&raw_signature).map_err(|_| CryptoError::Recovery)?;

    let key = VerifyingKey::recover_from_prehash(hash, &signature, recovery_id)
        .map_err(|_| CryptoError::Recovery)?;
    let point = key.to_encoded_point(false);
    <[u8; PUBLIC_KEY_LENGTH]>::try_from(point.as_bytes()).map_err(|_| CryptoError::Recovery)
}

/// Recovers the 20-byte address of the key which signed `hash`: the trailing
/// bytes of the Keccak-256 hash of the uncompressed public key without its
/// SEC1 tag.
pub fn ecrecover_address(hash: &[u8], v: &[u8], r: &[u8], s: &[u8]) -> Result<Address, CryptoError> {
    let key = ecrecover(hash, v, r, s)?;
    let digest = Digest::keccak256(&key[1..]);
    let mut raw = [0u8; Address::LENGTH];
    raw.copy_from_slice(&digest.as_bytes()[Digest::LENGTH - Address::LENGTH..]);
    Ok(Address::new(raw))
}
