//! Recoverable ECDSA signing over raw 32-byte digests.

use concord_types::{Address, Digest, RecoverableSignature};
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};

use crate::address::address_from_verifying_key;
use crate::keys::SecretKey;
use crate::CryptoError;

/// Sign a digest directly (no message prefixing), producing `r ‖ s ‖ v` with `v ∈ {27, 28}`.
pub fn sign_digest(
    digest: &Digest,
    secret: &SecretKey,
) -> Result<RecoverableSignature, CryptoError> {
    let signing_key = secret.signing_key()?;
    let (signature, recovery_id) = signing_key
        .sign_prehash_recoverable(digest.as_bytes())
        .map_err(|e| CryptoError::Signing(e.to_string()))?;
    let mut out = [0u8; 65];
    out[..64].copy_from_slice(&signature.to_bytes());
    out[64] = 27 + recovery_id.to_byte();
    Ok(RecoverableSignature(out))
}

/// Recover the address that produced `signature` over `digest`.
///
/// Rejects malleable (high-`s`) signatures and recovery ids outside
/// `{0, 1, 27, 28}`.
pub fn recover_signer(
    digest: &Digest,
    signature: &RecoverableSignature,
) -> Result<Address, CryptoError> {
    let v = signature.v();
    let raw_id = match v {
        27 | 28 => v - 27,
        0 | 1 => v,
        _ => return Err(CryptoError::InvalidRecoveryId(v)),
    };
    let recovery_id = RecoveryId::from_byte(raw_id).ok_or(CryptoError::InvalidRecoveryId(v))?;
    let sig = Signature::from_slice(signature.rs())
        .map_err(|e| CryptoError::MalformedSignature(e.to_string()))?;
    if sig.normalize_s().is_some() {
        return Err(CryptoError::MalformedSignature("high s value".into()));
    }
    let key = VerifyingKey::recover_from_prehash(digest.as_bytes(), &sig, recovery_id)
        .map_err(|_| CryptoError::RecoveryFailed)?;
    Ok(address_from_verifying_key(&key))
}
