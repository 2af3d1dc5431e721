//! Key and address helpers.

use alloy_primitives::Address;
use k256::ecdsa::{SigningKey, VerifyingKey};

/// Recover the address from a private key (SigningKey).
pub fn recover_address(private_key: &[u8]) -> Option<Address> {
    let key = SigningKey::from_slice(private_key).ok()?;
    Some(public_key_to_address(key.verifying_key()))
}

/// Address of an uncompressed secp256k1 public key.
pub fn public_key_to_address(key: &VerifyingKey) -> Address {
    let public_key = key.to_encoded_point(false);
    Address::from_raw_public_key(&public_key.as_bytes()[1..])
}
