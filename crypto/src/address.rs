//! Address derivation from secp256k1 public keys.
//!
//! Address = last 20 bytes of Keccak-256 over the 64-byte uncompressed public
//! key (the leading `0x04` tag is dropped). Checksummed display follows EIP-55.

use concord_types::Address;
use k256::ecdsa::VerifyingKey;

use crate::hash::keccak256;

/// Derive the address controlled by a verifying key.
pub fn address_from_verifying_key(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&hash[12..]);
    Address::new(bytes)
}

/// Mixed-case checksum encoding of an address.
pub fn to_checksum(address: &Address) -> String {
    let lower = hex::encode(address.as_bytes());
    let hash = keccak256(lower.as_bytes());
    let mut out = String::with_capacity(42);
    out.push_str("0x");
    for (i, c) in lower.chars().enumerate() {
        let nibble = (hash[i / 2] >> (if i % 2 == 0 { 4 } else { 0 })) & 0x0f;
        if nibble >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}
