//! Off-chain mode: principals sign a digest offline and anyone submits the
//! action with the signature set.
//!
//! `execute_transaction` is all-or-nothing. The nonce is checked before any
//! signature work, consumed only after authorization succeeds, and restored
//! if the action itself fails.

use concord_types::{Address, Digest, Nonce, Power, RecoverableSignature};

use crate::action::Action;
use crate::authority::{Authority, GovernanceCore};
use crate::authorizer::SignatureAuthorizer;
use crate::domain::{SigningDomain, PREFIX};
use crate::error::GovernanceError;
use crate::executor::GovernedExecutor;
use crate::policy::ConsensusPolicy;
use crate::registry::MembershipRegistry;
use crate::replay::ReplayGuard;
use crate::snapshot::OffchainSnapshot;

#[derive(Debug)]
pub struct OffchainGovernance {
    core: GovernanceCore,
    replay: ReplayGuard,
    domain: SigningDomain,
    executor: GovernedExecutor,
}

impl OffchainGovernance {
    pub fn new(
        address: Address,
        governors: &[Address],
        powers: &[Power],
        policy: ConsensusPolicy,
        domain: SigningDomain,
    ) -> Result<Self, GovernanceError> {
        let registry = MembershipRegistry::from_members(governors, powers)?;
        tracing::info!(
            %address,
            governors = registry.member_count(),
            total_power = registry.total_power(),
            %policy,
            "off-chain governance created"
        );
        Ok(Self {
            core: GovernanceCore::new(address, registry, policy),
            replay: ReplayGuard::new(),
            domain,
            executor: GovernedExecutor::new(),
        })
    }

    /// Restore from a snapshot, attaching live targets.
    pub fn from_snapshot(
        snapshot: OffchainSnapshot,
        executor: GovernedExecutor,
    ) -> Result<Self, GovernanceError> {
        if !snapshot.core.registry().is_consistent() {
            return Err(GovernanceError::CorruptSnapshot(
                "registry total does not match member powers".into(),
            ));
        }
        Ok(Self {
            core: snapshot.core,
            replay: snapshot.replay,
            domain: snapshot.domain,
            executor,
        })
    }

    pub fn snapshot(&self) -> OffchainSnapshot {
        OffchainSnapshot {
            core: self.core.clone(),
            replay: self.replay.clone(),
            domain: self.domain,
        }
    }

    pub fn with_executor(mut self, executor: GovernedExecutor) -> Self {
        self.executor = executor;
        self
    }

    pub fn executor(&self) -> &GovernedExecutor {
        &self.executor
    }

    pub fn executor_mut(&mut self) -> &mut GovernedExecutor {
        &mut self.executor
    }

    pub fn prefix(&self) -> [u8; 2] {
        PREFIX
    }

    pub fn domain_separator(&self) -> Option<Digest> {
        self.domain.separator()
    }

    /// The digest signers must sign for this nonce, target and payload.
    pub fn digest(&self, nonce: Nonce, target: &Address, payload: &[u8]) -> Digest {
        self.domain.digest(nonce, target, payload)
    }

    pub fn execute_transaction(
        &mut self,
        nonce: Nonce,
        target: Address,
        payload: &[u8],
        signatures: &[RecoverableSignature],
    ) -> Result<Vec<u8>, GovernanceError> {
        if let Err(e) = self.replay.check(nonce) {
            tracing::debug!(nonce, expected = self.replay.next(), "rejected stale or future nonce");
            return Err(e);
        }

        let digest = self.digest(nonce, &target, payload);
        let tally = match SignatureAuthorizer::new(&self.core).authorize(&digest, signatures) {
            Ok(tally) => tally,
            Err(e) => {
                tracing::debug!(nonce, %target, error = %e, "authorization rejected");
                return Err(e);
            }
        };

        let saved_replay = self.replay.clone();
        if !self.replay.consume(nonce) {
            return Err(GovernanceError::IdentifierReplay(nonce));
        }

        let action = Action::new(target, payload.to_vec());
        match self.executor.perform(&mut self.core, &action) {
            Ok(output) => {
                tracing::info!(
                    nonce,
                    %target,
                    signers = tally.signers.len(),
                    power = tally.power,
                    required = tally.required,
                    "transaction executed"
                );
                Ok(output)
            }
            Err(e) => {
                self.replay = saved_replay;
                tracing::debug!(nonce, %target, error = %e, "execution failed, nonce restored");
                Err(e)
            }
        }
    }
}

impl Authority for OffchainGovernance {
    fn core(&self) -> &GovernanceCore {
        &self.core
    }

    fn transactions_count(&self) -> u64 {
        self.replay.next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Amendment;
    use crate::text_store::TextStore;
    use concord_crypto::{sign_digest, SecretKey};

    const ENGINE: Address = Address::new([0xee; 20]);
    const STORE: Address = Address::new([0x51; 20]);

    fn keys(n: u8) -> Vec<SecretKey> {
        let mut keys: Vec<SecretKey> = (1..=n)
            .map(|i| SecretKey::from_bytes([i; 32]).unwrap())
            .collect();
        keys.sort_by_key(|k| k.address().unwrap());
        keys
    }

    fn engine(keys: &[SecretKey]) -> OffchainGovernance {
        let governors: Vec<Address> = keys.iter().map(|k| k.address().unwrap()).collect();
        let mut engine = OffchainGovernance::new(
            ENGINE,
            &governors,
            &vec![1; governors.len()],
            ConsensusPolicy::TWO_THIRDS,
            SigningDomain::for_chain(1, &ENGINE),
        )
        .unwrap();
        engine
            .executor_mut()
            .targets_mut()
            .register(STORE, Box::new(TextStore::new(ENGINE)));
        engine
    }

    fn sign(
        engine: &OffchainGovernance,
        nonce: Nonce,
        target: &Address,
        payload: &[u8],
        keys: &[SecretKey],
    ) -> Vec<RecoverableSignature> {
        let digest = engine.digest(nonce, target, payload);
        keys.iter().map(|k| sign_digest(&digest, k).unwrap()).collect()
    }

    #[test]
    fn executes_and_advances_nonce() {
        let keys = keys(3);
        let mut engine = engine(&keys);
        let payload = TextStore::set_text_call("hello");
        let sigs = sign(&engine, 0, &STORE, &payload, &keys[..2]);
        engine.execute_transaction(0, STORE, &payload, &sigs).unwrap();
        assert_eq!(engine.transactions_count(), 1);
        assert_eq!(
            engine.executor().targets().get::<TextStore>(&STORE).unwrap().text(),
            "hello"
        );
    }

    #[test]
    fn signatures_for_other_nonce_do_not_authorize() {
        let keys = keys(3);
        let mut engine = engine(&keys);
        let payload = TextStore::set_text_call("hello");
        let sigs = sign(&engine, 1, &STORE, &payload, &keys);
        // Signatures over nonce 1 recover to unrelated addresses under nonce 0.
        let result = engine.execute_transaction(0, STORE, &payload, &sigs);
        assert!(result.is_err());
        assert_eq!(engine.transactions_count(), 0);
    }

    #[test]
    fn failed_call_restores_nonce() {
        let keys = keys(3);
        let mut engine = engine(&keys);
        engine
            .executor_mut()
            .targets_mut()
            .get_mut::<TextStore>(&STORE)
            .unwrap()
            .transfer_ownership(ENGINE, Address::new([7; 20]))
            .unwrap();
        let payload = TextStore::set_text_call("x");
        let sigs = sign(&engine, 0, &STORE, &payload, &keys);
        assert!(matches!(
            engine.execute_transaction(0, STORE, &payload, &sigs),
            Err(GovernanceError::CallFailed { .. })
        ));
        assert_eq!(engine.transactions_count(), 0);
    }

    #[test]
    fn invalid_amendment_restores_nonce() {
        let keys = keys(3);
        let mut engine = engine(&keys);
        let payload = Amendment::SetConsensus {
            numerator: 4,
            denominator: 3,
        }
        .encode();
        let sigs = sign(&engine, 0, &ENGINE, &payload, &keys);
        assert!(matches!(
            engine.execute_transaction(0, ENGINE, &payload, &sigs),
            Err(GovernanceError::InvalidRatio { .. })
        ));
        assert_eq!(engine.transactions_count(), 0);
        assert_eq!(engine.get_consensus(), (2, 3));
    }

    #[test]
    fn self_amendment_changes_membership() {
        let keys = keys(3);
        let mut engine = engine(&keys);
        let newcomer = Address::new([0x42; 20]);
        let payload = Amendment::UpdatePower {
            principal: newcomer,
            power: 2,
        }
        .encode();
        let sigs = sign(&engine, 0, &ENGINE, &payload, &keys);
        engine.execute_transaction(0, ENGINE, &payload, &sigs).unwrap();
        assert_eq!(engine.power_of(&newcomer), 2);
        assert_eq!(engine.total_power(), 5);
        assert_eq!(engine.required(), 4);
        assert!(engine.is_validator(&newcomer));
    }

    #[test]
    fn snapshot_round_trip() {
        let keys = keys(3);
        let mut engine = engine(&keys);
        let payload = TextStore::set_text_call("a");
        let sigs = sign(&engine, 0, &STORE, &payload, &keys);
        engine.execute_transaction(0, STORE, &payload, &sigs).unwrap();

        let snapshot = engine.snapshot();
        let restored =
            OffchainGovernance::from_snapshot(snapshot.clone(), GovernedExecutor::new()).unwrap();
        assert_eq!(restored.snapshot(), snapshot);
        assert_eq!(restored.transactions_count(), 1);
        assert_eq!(restored.domain_separator(), engine.domain_separator());
        assert_eq!(restored.prefix(), [0x19, 0x00]);
    }
}
