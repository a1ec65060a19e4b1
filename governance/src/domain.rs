//! Digest construction for off-chain signatures.
//!
//! `keccak256(PREFIX ‖ [separator] ‖ nonce(32, BE) ‖ target(20) ‖ payload)`.
//! Signers reproduce this preimage byte for byte, so the layout is fixed.

use concord_crypto::{keccak256, keccak256_multi};
use concord_types::{Address, Digest, Nonce};
use serde::{Deserialize, Serialize};

/// EIP-191 version 0x00: data with intended validator.
pub const PREFIX: [u8; 2] = [0x19, 0x00];

const DOMAIN_TAG: &[u8] = b"concord.governance";

/// Separator binding signatures to one engine on one chain.
pub fn domain_separator(chain_id: u64, engine: &Address) -> Digest {
    let mut chain = [0u8; 32];
    chain[24..].copy_from_slice(&chain_id.to_be_bytes());
    Digest::new(keccak256_multi(&[DOMAIN_TAG, &chain, engine.as_bytes()]))
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningDomain {
    separator: Option<Digest>,
}

impl SigningDomain {
    /// No separator: the owner-only layout.
    pub fn plain() -> Self {
        Self { separator: None }
    }

    pub fn with_separator(separator: Digest) -> Self {
        Self {
            separator: Some(separator),
        }
    }

    pub fn for_chain(chain_id: u64, engine: &Address) -> Self {
        Self::with_separator(domain_separator(chain_id, engine))
    }

    pub fn separator(&self) -> Option<Digest> {
        self.separator
    }

    pub fn digest(&self, nonce: Nonce, target: &Address, payload: &[u8]) -> Digest {
        let mut nonce_word = [0u8; 32];
        nonce_word[24..].copy_from_slice(&nonce.to_be_bytes());

        let mut preimage = Vec::with_capacity(2 + 32 + 32 + 20 + payload.len());
        preimage.extend_from_slice(&PREFIX);
        if let Some(separator) = &self.separator {
            preimage.extend_from_slice(separator.as_bytes());
        }
        preimage.extend_from_slice(&nonce_word);
        preimage.extend_from_slice(target.as_bytes());
        preimage.extend_from_slice(payload);
        Digest::new(keccak256(&preimage))
    }
}
