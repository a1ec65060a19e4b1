//! Verifies a set of signatures against the membership registry.

use concord_crypto::recover_signer;
use concord_types::{Address, Digest, Power, RecoverableSignature};

use crate::authority::GovernanceCore;
use crate::error::GovernanceError;

/// Outcome of a successful authorization.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tally {
    /// Recovered signers, strictly ascending.
    pub signers: Vec<Address>,
    /// Power the signers hold together.
    pub power: Power,
    /// Threshold that was met.
    pub required: Power,
}

/// Checks signatures over a digest: every one must recover, signers must be
/// strictly ascending, and their combined power must meet the threshold.
///
/// Pure: nothing is mutated, so the caller decides what to commit.
pub struct SignatureAuthorizer<'a> {
    core: &'a GovernanceCore,
}

impl<'a> SignatureAuthorizer<'a> {
    pub fn new(core: &'a GovernanceCore) -> Self {
        Self { core }
    }

    pub fn authorize(
        &self,
        digest: &Digest,
        signatures: &[RecoverableSignature],
    ) -> Result<Tally, GovernanceError> {
        let registry = self.core.registry();
        let mut signers = Vec::with_capacity(signatures.len());
        let mut power: Power = 0;

        for (index, signature) in signatures.iter().enumerate() {
            let signer = recover_signer(digest, signature)
                .map_err(|source| GovernanceError::InvalidSignature { index, source })?;
            if let Some(last) = signers.last() {
                if signer <= *last {
                    return Err(GovernanceError::InvalidArrangement { index });
                }
            }
            // Unknown signers contribute nothing but do not spoil the set.
            power = power.saturating_add(registry.power_of(&signer));
            signers.push(signer);
        }

        let required = self.core.required();
        if power < required {
            return Err(GovernanceError::InsufficientConsensus {
                have: power,
                need: required,
            });
        }
        Ok(Tally {
            signers,
            power,
            required,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::ConsensusPolicy;
    use crate::registry::MembershipRegistry;
    use concord_crypto::{sign_digest, SecretKey};

    fn keys() -> Vec<SecretKey> {
        let mut keys: Vec<SecretKey> = (1u8..=3)
            .map(|n| SecretKey::from_bytes([n; 32]).unwrap())
            .collect();
        keys.sort_by_key(|k| k.address().unwrap());
        keys
    }

    fn core_for(keys: &[SecretKey]) -> GovernanceCore {
        let members: Vec<Address> = keys.iter().map(|k| k.address().unwrap()).collect();
        GovernanceCore::new(
            Address::new([0xee; 20]),
            MembershipRegistry::from_members(&members, &vec![1; members.len()]).unwrap(),
            ConsensusPolicy::TWO_THIRDS,
        )
    }

    fn sign_all(digest: &Digest, keys: &[&SecretKey]) -> Vec<RecoverableSignature> {
        keys.iter().map(|k| sign_digest(digest, k).unwrap()).collect()
    }

    #[test]
    fn ascending_quorum_passes() {
        let keys = keys();
        let core = core_for(&keys);
        let digest = Digest::new([9; 32]);
        let sigs = sign_all(&digest, &[&keys[0], &keys[2]]);
        let tally = SignatureAuthorizer::new(&core).authorize(&digest, &sigs).unwrap();
        assert_eq!(tally.power, 2);
        assert_eq!(tally.required, 2);
        assert_eq!(tally.signers.len(), 2);
    }

    #[test]
    fn descending_order_rejected() {
        let keys = keys();
        let core = core_for(&keys);
        let digest = Digest::new([9; 32]);
        let sigs = sign_all(&digest, &[&keys[2], &keys[0]]);
        assert!(matches!(
            SignatureAuthorizer::new(&core).authorize(&digest, &sigs),
            Err(GovernanceError::InvalidArrangement { index: 1 })
        ));
    }

    #[test]
    fn duplicate_signer_rejected() {
        let keys = keys();
        let core = core_for(&keys);
        let digest = Digest::new([9; 32]);
        let sigs = sign_all(&digest, &[&keys[1], &keys[1]]);
        assert!(matches!(
            SignatureAuthorizer::new(&core).authorize(&digest, &sigs),
            Err(GovernanceError::InvalidArrangement { index: 1 })
        ));
    }

    #[test]
    fn below_threshold_rejected() {
        let keys = keys();
        let core = core_for(&keys);
        let digest = Digest::new([9; 32]);
        let sigs = sign_all(&digest, &[&keys[0]]);
        assert!(matches!(
            SignatureAuthorizer::new(&core).authorize(&digest, &sigs),
            Err(GovernanceError::InsufficientConsensus { have: 1, need: 2 })
        ));
    }

    #[test]
    fn garbage_signature_rejected() {
        let keys = keys();
        let core = core_for(&keys);
        let digest = Digest::new([9; 32]);
        let mut sigs = sign_all(&digest, &[&keys[0]]);
        sigs.push(RecoverableSignature([0u8; 65]));
        assert!(matches!(
            SignatureAuthorizer::new(&core).authorize(&digest, &sigs),
            Err(GovernanceError::InvalidSignature { index: 1, .. })
        ));
    }

    #[test]
    fn outsider_adds_nothing() {
        let keys = keys();
        let core = core_for(&keys[..2]);
        let digest = Digest::new([9; 32]);
        // keys[2] is not a member; with two members 2/3 needs both.
        let outsider_first = {
            let mut all: Vec<&SecretKey> = vec![&keys[0], &keys[2]];
            all.sort_by_key(|k| k.address().unwrap());
            sign_all(&digest, &all)
        };
        assert!(matches!(
            SignatureAuthorizer::new(&core).authorize(&digest, &outsider_first),
            Err(GovernanceError::InsufficientConsensus { have: 1, need: 2 })
        ));
    }

    #[test]
    fn empty_set_passes_zero_threshold() {
        let core = GovernanceCore::new(
            Address::ZERO,
            MembershipRegistry::new(),
            ConsensusPolicy::NONE,
        );
        let tally = SignatureAuthorizer::new(&core)
            .authorize(&Digest::ZERO, &[])
            .unwrap();
        assert_eq!(tally.power, 0);
    }
}
