//! secp256k1 key generation.

use concord_types::Address;
use k256::ecdsa::SigningKey;
use rand::rngs::OsRng;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::address::address_from_verifying_key;
use crate::CryptoError;

/// A 32-byte secp256k1 secret scalar.
///
/// This type intentionally does not implement `Debug`, `Serialize`, or `Clone`
/// to prevent accidental exposure. Key bytes are zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SecretKey([u8; 32]);

impl SecretKey {
    /// Wrap raw secret bytes, rejecting zero and out-of-range scalars.
    pub fn from_bytes(bytes: [u8; 32]) -> Result<Self, CryptoError> {
        SigningKey::from_slice(&bytes).map_err(|_| CryptoError::InvalidSecretKey)?;
        Ok(Self(bytes))
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let arr: [u8; 32] = bytes.try_into().map_err(|_| CryptoError::InvalidSecretKey)?;
        Self::from_bytes(arr)
    }

    pub(crate) fn signing_key(&self) -> Result<SigningKey, CryptoError> {
        SigningKey::from_slice(&self.0).map_err(|_| CryptoError::InvalidSecretKey)
    }

    /// Address controlled by this key.
    pub fn address(&self) -> Result<Address, CryptoError> {
        let signing_key = self.signing_key()?;
        Ok(address_from_verifying_key(signing_key.verifying_key()))
    }
}

/// A secret key together with the address it controls.
pub struct KeyPair {
    pub secret: SecretKey,
    pub address: Address,
}

impl KeyPair {
    pub fn from_secret(secret: SecretKey) -> Result<Self, CryptoError> {
        let address = secret.address()?;
        Ok(Self { secret, address })
    }
}

/// Generate a new key pair from a secure random source.
pub fn generate_keypair() -> KeyPair {
    let signing_key = SigningKey::random(&mut OsRng);
    let address = address_from_verifying_key(signing_key.verifying_key());
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&signing_key.to_bytes());
    KeyPair {
        secret: SecretKey(bytes),
        address,
    }
}
