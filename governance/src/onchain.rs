//! On-chain mode: governors vote one call at a time, and an action runs the
//! moment its head count reaches the live threshold.
//!
//! Every member holds power 1, so votes and power coincide. Amendments that
//! would grant more are refused. The threshold is read from the current
//! registry on each call, never fixed at proposal time.

use concord_types::{Address, TxId};

use crate::action::{Action, Amendment};
use crate::authority::{Authority, GovernanceCore};
use crate::error::GovernanceError;
use crate::executor::GovernedExecutor;
use crate::ledger::{VoteRecord, VotingLedger};
use crate::policy::ConsensusPolicy;
use crate::registry::MembershipRegistry;
use crate::snapshot::OnchainSnapshot;

/// Where a proposal stands after a confirmation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VoteStatus {
    pub id: TxId,
    pub votes: u64,
    pub executed: bool,
}

#[derive(Debug)]
pub struct OnchainGovernance {
    core: GovernanceCore,
    ledger: VotingLedger,
    executor: GovernedExecutor,
}

impl OnchainGovernance {
    /// Equal-weight governance: each governor gets power 1.
    pub fn new(
        address: Address,
        governors: &[Address],
        policy: ConsensusPolicy,
    ) -> Result<Self, GovernanceError> {
        let registry = MembershipRegistry::from_members(governors, &vec![1; governors.len()])?;
        tracing::info!(
            %address,
            governors = registry.member_count(),
            %policy,
            "on-chain governance created"
        );
        Ok(Self {
            core: GovernanceCore::new(address, registry, policy),
            ledger: VotingLedger::new(),
            executor: GovernedExecutor::new(),
        })
    }

    pub fn from_snapshot(
        snapshot: OnchainSnapshot,
        executor: GovernedExecutor,
    ) -> Result<Self, GovernanceError> {
        let registry = snapshot.core.registry();
        if !registry.is_consistent() {
            return Err(GovernanceError::CorruptSnapshot(
                "registry total does not match member powers".into(),
            ));
        }
        if let Some(member) = registry
            .members()
            .iter()
            .find(|m| registry.power_of(m) != 1)
        {
            return Err(GovernanceError::CorruptSnapshot(format!(
                "member {member} holds power {} in an equal-weight registry",
                registry.power_of(member)
            )));
        }
        Ok(Self {
            core: snapshot.core,
            ledger: snapshot.ledger,
            executor,
        })
    }

    pub fn snapshot(&self) -> OnchainSnapshot {
        OnchainSnapshot {
            core: self.core.clone(),
            ledger: self.ledger.clone(),
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

    pub fn ledger(&self) -> &VotingLedger {
        &self.ledger
    }

    pub fn get_transaction(&self, id: TxId) -> Result<&VoteRecord, GovernanceError> {
        self.ledger
            .get(id)
            .ok_or(GovernanceError::TransactionNotFound(id))
    }

    fn ensure_governor(&self, caller: &Address) -> Result<(), GovernanceError> {
        if !self.core.registry().is_member(caller) {
            tracing::debug!(%caller, "rejected call from non-governor");
            return Err(GovernanceError::Unauthorized(*caller));
        }
        Ok(())
    }

    fn ensure_equal_weight(&self, action: &Action) -> Result<(), GovernanceError> {
        if action.target != self.core.address() {
            return Ok(());
        }
        match Amendment::decode(&action.payload) {
            Ok(Amendment::UpdatePower { principal, power }) if power > 1 => {
                tracing::debug!(%principal, power, "rejected weighted power grant");
                Err(GovernanceError::WeightedPower { principal, power })
            }
            _ => Ok(()),
        }
    }

    fn perform(&mut self, action: &Action) -> Result<Vec<u8>, GovernanceError> {
        self.ensure_equal_weight(action)?;
        self.executor.perform(&mut self.core, action)
    }

    /// Propose an action; the caller's own vote is counted. Executes
    /// straight away when a single vote already meets the threshold.
    pub fn create_transaction(
        &mut self,
        caller: Address,
        target: Address,
        value: u128,
        payload: Vec<u8>,
    ) -> Result<TxId, GovernanceError> {
        self.ensure_governor(&caller)?;
        let action = Action::with_value(target, value, payload);
        self.ensure_equal_weight(&action)?;
        let id = self.ledger.next_id();

        let executed = self.core.required() <= 1;
        if executed {
            self.perform(&action)?;
            tracing::info!(id, %caller, %target, "transaction created and executed");
        } else {
            tracing::debug!(id, %caller, %target, required = self.core.required(), "transaction created");
        }
        Ok(self.ledger.push(action, caller, executed))
    }

    /// Add the caller's vote, executing once the tally meets the threshold.
    pub fn confirm_transaction(
        &mut self,
        caller: Address,
        id: TxId,
    ) -> Result<VoteStatus, GovernanceError> {
        let record = self
            .ledger
            .get(id)
            .ok_or(GovernanceError::TransactionNotFound(id))?;
        self.ensure_governor(&caller)?;
        if record.is_executed() {
            return Err(GovernanceError::AlreadyExecuted(id));
        }
        if record.has_confirmed(&caller) {
            return Err(GovernanceError::AlreadyConfirmed {
                id,
                principal: caller,
            });
        }

        let votes = record.votes() + 1;
        let required = self.core.required();
        let executed = u128::from(votes) >= required;
        if executed {
            let action = record.action().clone();
            self.perform(&action)?;
            self.ledger.mark_executed(id);
            tracing::info!(id, %caller, votes, required, "transaction confirmed and executed");
        } else {
            tracing::debug!(id, %caller, votes, required, "vote recorded");
        }
        self.ledger.record_vote(id, caller);

        Ok(VoteStatus {
            id,
            votes,
            executed,
        })
    }

    /// Run an action whose recorded votes already meet the current threshold.
    ///
    /// Open to any caller: it only completes what the votes authorize.
    pub fn execute_transaction(&mut self, id: TxId) -> Result<Vec<u8>, GovernanceError> {
        let record = self
            .ledger
            .get(id)
            .ok_or(GovernanceError::TransactionNotFound(id))?;
        if record.is_executed() {
            return Err(GovernanceError::AlreadyExecuted(id));
        }
        let votes = record.votes();
        let required = self.core.required();
        if u128::from(votes) < required {
            return Err(GovernanceError::ConsensusNotAchieved {
                have: votes,
                need: required,
            });
        }

        let action = record.action().clone();
        let output = self.perform(&action)?;
        self.ledger.mark_executed(id);
        tracing::info!(id, votes, required, "transaction executed");
        Ok(output)
    }
}

impl Authority for OnchainGovernance {
    fn core(&self) -> &GovernanceCore {
        &self.core
    }

    fn transactions_count(&self) -> u64 {
        self.ledger.next_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Amendment;
    use crate::text_store::TextStore;

    const ENGINE: Address = Address::new([0xee; 20]);
    const STORE: Address = Address::new([0x51; 20]);

    fn governors() -> Vec<Address> {
        (1u8..=5).map(|n| Address::new([n; 20])).collect()
    }

    fn engine(policy: ConsensusPolicy) -> OnchainGovernance {
        let mut engine = OnchainGovernance::new(ENGINE, &governors(), policy).unwrap();
        engine
            .executor_mut()
            .targets_mut()
            .register(STORE, Box::new(TextStore::new(ENGINE)));
        engine
    }

    fn text(engine: &OnchainGovernance) -> &str {
        engine.executor().targets().get::<TextStore>(&STORE).unwrap().text()
    }

    #[test]
    fn outsider_cannot_propose() {
        let mut engine = engine(ConsensusPolicy::TWO_THIRDS);
        let outsider = Address::new([0x99; 20]);
        assert!(matches!(
            engine.create_transaction(outsider, STORE, 0, TextStore::set_text_call("x")),
            Err(GovernanceError::Unauthorized(a)) if a == outsider
        ));
        assert!(engine.ledger().is_empty());
    }

    #[test]
    fn outsider_cannot_confirm() {
        let mut engine = engine(ConsensusPolicy::TWO_THIRDS);
        let g = governors();
        let id = engine
            .create_transaction(g[0], STORE, 0, TextStore::set_text_call("x"))
            .unwrap();
        assert!(matches!(
            engine.confirm_transaction(Address::new([0x99; 20]), id),
            Err(GovernanceError::Unauthorized(_))
        ));
    }

    #[test]
    fn confirmations_reach_threshold() {
        let mut engine = engine(ConsensusPolicy::TWO_THIRDS);
        let g = governors();
        let id = engine
            .create_transaction(g[0], STORE, 0, TextStore::set_text_call("voted"))
            .unwrap();
        assert_eq!(engine.confirm_transaction(g[1], id).unwrap().votes, 2);
        assert!(!engine.confirm_transaction(g[2], id).unwrap().executed);
        assert_eq!(text(&engine), "");
        let status = engine.confirm_transaction(g[3], id).unwrap();
        assert_eq!(
            status,
            VoteStatus {
                id,
                votes: 4,
                executed: true
            }
        );
        assert_eq!(text(&engine), "voted");
    }

    #[test]
    fn double_confirm_rejected() {
        let mut engine = engine(ConsensusPolicy::TWO_THIRDS);
        let g = governors();
        let id = engine
            .create_transaction(g[0], STORE, 0, TextStore::set_text_call("x"))
            .unwrap();
        assert!(matches!(
            engine.confirm_transaction(g[0], id),
            Err(GovernanceError::AlreadyConfirmed { .. })
        ));
        assert_eq!(engine.get_transaction(id).unwrap().votes(), 1);
    }

    #[test]
    fn unknown_transaction() {
        let mut engine = engine(ConsensusPolicy::TWO_THIRDS);
        assert!(matches!(
            engine.confirm_transaction(governors()[0], 7),
            Err(GovernanceError::TransactionNotFound(7))
        ));
        assert!(matches!(
            engine.execute_transaction(7),
            Err(GovernanceError::TransactionNotFound(7))
        ));
    }

    #[test]
    fn failed_execution_records_no_vote() {
        let mut engine = engine(ConsensusPolicy::new(1, 2).unwrap());
        let g = governors();
        engine
            .executor_mut()
            .targets_mut()
            .get_mut::<TextStore>(&STORE)
            .unwrap()
            .transfer_ownership(ENGINE, Address::new([7; 20]))
            .unwrap();
        let id = engine
            .create_transaction(g[0], STORE, 0, TextStore::set_text_call("x"))
            .unwrap();
        engine.confirm_transaction(g[1], id).unwrap();
        assert!(matches!(
            engine.confirm_transaction(g[2], id),
            Err(GovernanceError::CallFailed { .. })
        ));
        let record = engine.get_transaction(id).unwrap();
        assert_eq!(record.votes(), 2);
        assert!(!record.is_executed());
    }

    #[test]
    fn lowered_ratio_enables_trigger() {
        let mut engine = engine(ConsensusPolicy::TWO_THIRDS);
        let g = governors();
        let pending = engine
            .create_transaction(g[0], STORE, 0, TextStore::set_text_call("late"))
            .unwrap();
        engine.confirm_transaction(g[1], pending).unwrap();

        let amend = engine
            .create_transaction(
                g[0],
                ENGINE,
                0,
                Amendment::SetConsensus {
                    numerator: 1,
                    denominator: 3,
                }
                .encode(),
            )
            .unwrap();
        for voter in &g[1..4] {
            engine.confirm_transaction(*voter, amend).unwrap();
        }
        assert_eq!(engine.required(), 2);
        assert!(!engine.get_transaction(pending).unwrap().is_executed());

        engine.execute_transaction(pending).unwrap();
        assert_eq!(text(&engine), "late");
        assert!(matches!(
            engine.execute_transaction(pending),
            Err(GovernanceError::AlreadyExecuted(_))
        ));
    }

    #[test]
    fn snapshot_round_trip() {
        let mut engine = engine(ConsensusPolicy::TWO_THIRDS);
        let g = governors();
        let id = engine
            .create_transaction(g[0], STORE, 0, TextStore::set_text_call("x"))
            .unwrap();
        engine.confirm_transaction(g[1], id).unwrap();

        let snapshot = engine.snapshot();
        let restored =
            OnchainGovernance::from_snapshot(snapshot.clone(), GovernedExecutor::new()).unwrap();
        assert_eq!(restored.snapshot(), snapshot);
        assert_eq!(restored.transactions_count(), 1);
        assert_eq!(restored.get_transaction(id).unwrap().votes(), 2);
    }

    #[test]
    fn weighted_power_grant_refused() {
        let mut engine = engine(ConsensusPolicy::NONE);
        let g = governors();
        let grant = Amendment::UpdatePower {
            principal: g[0],
            power: 10,
        }
        .encode();
        assert!(matches!(
            engine.create_transaction(g[0], ENGINE, 0, grant),
            Err(GovernanceError::WeightedPower { principal, power: 10 }) if principal == g[0]
        ));
        assert!(engine.ledger().is_empty());
        assert_eq!(engine.power_of(&g[0]), 1);
        assert_eq!(engine.total_power(), 5);

        // Raising the bar afterwards still leaves every proposal reachable.
        engine
            .create_transaction(
                g[0],
                ENGINE,
                0,
                Amendment::SetConsensus {
                    numerator: 2,
                    denominator: 3,
                }
                .encode(),
            )
            .unwrap();
        assert_eq!(engine.required(), 4);
        let revoke = engine
            .create_transaction(
                g[0],
                ENGINE,
                0,
                Amendment::UpdatePower {
                    principal: g[4],
                    power: 0,
                }
                .encode(),
            )
            .unwrap();
        for voter in &g[1..4] {
            engine.confirm_transaction(*voter, revoke).unwrap();
        }
        assert!(engine.get_transaction(revoke).unwrap().is_executed());
        assert!(!engine.is_governor(&g[4]));
    }

    #[test]
    fn unit_power_grant_allowed() {
        let mut engine = engine(ConsensusPolicy::NONE);
        let newcomer = Address::new([0x42; 20]);
        engine
            .create_transaction(
                governors()[0],
                ENGINE,
                0,
                Amendment::UpdatePower {
                    principal: newcomer,
                    power: 1,
                }
                .encode(),
            )
            .unwrap();
        assert_eq!(engine.power_of(&newcomer), 1);
        assert_eq!(engine.governors_count(), 6);
    }

    #[test]
    fn weighted_snapshot_rejected() {
        let mut snapshot = engine(ConsensusPolicy::NONE).snapshot();
        let members = governors();
        snapshot.core = GovernanceCore::new(
            ENGINE,
            MembershipRegistry::from_members(&members, &[10, 1, 1, 1, 1]).unwrap(),
            ConsensusPolicy::TWO_THIRDS,
        );
        assert!(matches!(
            OnchainGovernance::from_snapshot(snapshot, GovernedExecutor::new()),
            Err(GovernanceError::CorruptSnapshot(_))
        ));
    }

    #[test]
    fn failed_immediate_execution_records_nothing() {
        let mut engine = engine(ConsensusPolicy::NONE);
        engine
            .executor_mut()
            .targets_mut()
            .get_mut::<TextStore>(&STORE)
            .unwrap()
            .transfer_ownership(ENGINE, Address::new([7; 20]))
            .unwrap();
        assert!(matches!(
            engine.create_transaction(governors()[0], STORE, 0, TextStore::set_text_call("x")),
            Err(GovernanceError::CallFailed { .. })
        ));
        assert!(engine.ledger().is_empty());
        assert_eq!(engine.transactions_count(), 0);
    }

    #[test]
    fn failed_trigger_stays_pending() {
        let mut engine = engine(ConsensusPolicy::TWO_THIRDS);
        let g = governors();
        let id = engine
            .create_transaction(g[0], STORE, 0, TextStore::set_text_call("retry"))
            .unwrap();
        for voter in &g[1..3] {
            engine.confirm_transaction(*voter, id).unwrap();
        }

        // Shrink the registry so the three recorded votes meet the bar.
        let amend = engine
            .create_transaction(
                g[0],
                ENGINE,
                0,
                Amendment::UpdateValidators {
                    principals: vec![g[4]],
                    flags: vec![false],
                }
                .encode(),
            )
            .unwrap();
        for voter in &g[1..4] {
            engine.confirm_transaction(*voter, amend).unwrap();
        }
        assert_eq!(engine.required(), 3);

        let store = engine
            .executor_mut()
            .targets_mut()
            .get_mut::<TextStore>(&STORE)
            .unwrap();
        store
            .transfer_ownership(ENGINE, Address::new([7; 20]))
            .unwrap();
        assert!(matches!(
            engine.execute_transaction(id),
            Err(GovernanceError::CallFailed { .. })
        ));
        let record = engine.get_transaction(id).unwrap();
        assert!(!record.is_executed());
        assert_eq!(record.votes(), 3);

        engine
            .executor_mut()
            .targets_mut()
            .get_mut::<TextStore>(&STORE)
            .unwrap()
            .transfer_ownership(Address::new([7; 20]), ENGINE)
            .unwrap();
        engine.execute_transaction(id).unwrap();
        assert_eq!(text(&engine), "retry");
        assert!(engine.get_transaction(id).unwrap().is_executed());
    }
}
