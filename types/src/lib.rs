//! Fundamental types for the concord threshold authorization engine.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! principal addresses, digests, recoverable signatures, and the integer aliases
//! used for power, nonces and on-chain transaction ids.

pub mod address;
pub mod error;
pub mod hash;
pub mod keys;

pub use address::Address;
pub use error::TypesError;
pub use hash::Digest;
pub use keys::RecoverableSignature;

/// Voting weight a principal contributes toward consensus.
pub type Power = u128;

/// Off-chain action identifier, drawn from a single global sequence.
pub type Nonce = u64;

/// On-chain action identifier, auto-incremented per proposal.
pub type TxId = u64;

/// Parse a hex string with an optional `0x` prefix.
pub fn decode_hex(s: &str) -> Result<Vec<u8>, TypesError> {
    let trimmed = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    hex::decode(trimmed).map_err(|e| TypesError::InvalidHex(e.to_string()))
}

/// Encode bytes as a `0x`-prefixed lowercase hex string.
pub fn encode_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}
