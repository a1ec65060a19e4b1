//! Cryptographic primitives for concord.
//!
//! - **Keccak-256** for action digests, selectors and address derivation
//! - **secp256k1 ECDSA** with recoverable signatures (`r ‖ s ‖ v`)
//! - Address derivation: last 20 bytes of Keccak-256 over the uncompressed public key

pub mod address;
pub mod error;
pub mod hash;
pub mod keys;
pub mod sign;

pub use address::{address_from_verifying_key, to_checksum};
pub use error::CryptoError;
pub use hash::{keccak256, keccak256_multi};
pub use keys::{generate_keypair, KeyPair, SecretKey};
pub use sign::{recover_signer, sign_digest};
