//! State shared by both engine modes (who governs and how much agreement
//! an action needs) and the read-only view over it.

use concord_types::{Address, Power};
use serde::{Deserialize, Serialize};

use crate::action::Amendment;
use crate::error::GovernanceError;
use crate::policy::ConsensusPolicy;
use crate::registry::MembershipRegistry;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceCore {
    address: Address,
    registry: MembershipRegistry,
    policy: ConsensusPolicy,
}

impl GovernanceCore {
    pub fn new(address: Address, registry: MembershipRegistry, policy: ConsensusPolicy) -> Self {
        Self {
            address,
            registry,
            policy,
        }
    }

    /// The engine's own address; actions aimed here are self-amendments.
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn registry(&self) -> &MembershipRegistry {
        &self.registry
    }

    pub fn policy(&self) -> ConsensusPolicy {
        self.policy
    }

    /// Threshold for the current total power.
    pub fn required(&self) -> Power {
        self.policy.required(self.registry.total_power())
    }

    /// Apply a self-amendment. Fails without change on invalid input.
    pub(crate) fn apply(&mut self, amendment: Amendment) -> Result<(), GovernanceError> {
        match amendment {
            Amendment::UpdatePower { principal, power } => {
                let previous = self.registry.update_power(principal, power)?;
                tracing::info!(
                    %principal,
                    previous,
                    power,
                    total = self.registry.total_power(),
                    "power updated"
                );
            }
            Amendment::UpdateValidators { principals, flags } => {
                self.registry.update_many(&principals, &flags)?;
                tracing::info!(
                    changed = principals.len(),
                    members = self.registry.member_count(),
                    total = self.registry.total_power(),
                    "validators updated"
                );
            }
            Amendment::SetConsensus {
                numerator,
                denominator,
            } => {
                self.policy = ConsensusPolicy::new(numerator, denominator)?;
                tracing::info!(policy = %self.policy, "consensus ratio updated");
            }
        }
        Ok(())
    }
}

/// Read-only view every engine exposes to callers and governed targets.
pub trait Authority {
    fn core(&self) -> &GovernanceCore;

    /// Next off-chain nonce or next on-chain transaction id.
    fn transactions_count(&self) -> u64;

    fn address(&self) -> Address {
        self.core().address()
    }

    fn power_of(&self, principal: &Address) -> Power {
        self.core().registry().power_of(principal)
    }

    fn total_power(&self) -> Power {
        self.core().registry().total_power()
    }

    fn is_governor(&self, principal: &Address) -> bool {
        self.core().registry().is_member(principal)
    }

    fn is_validator(&self, principal: &Address) -> bool {
        self.is_governor(principal)
    }

    /// Members with nonzero power, in the order they were granted.
    fn governors(&self) -> Vec<Address> {
        self.core().registry().members().to_vec()
    }

    fn governors_count(&self) -> usize {
        self.core().registry().member_count()
    }

    fn get_consensus(&self) -> (u64, u64) {
        self.core().policy().ratio()
    }

    fn required(&self) -> Power {
        self.core().required()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn core() -> GovernanceCore {
        let members = [Address::new([1; 20]), Address::new([2; 20]), Address::new([3; 20])];
        GovernanceCore::new(
            Address::new([0xee; 20]),
            MembershipRegistry::from_members(&members, &[1, 1, 1]).unwrap(),
            ConsensusPolicy::TWO_THIRDS,
        )
    }

    #[test]
    fn required_tracks_registry() {
        let mut core = core();
        assert_eq!(core.required(), 2);
        core.apply(Amendment::UpdatePower {
            principal: Address::new([4; 20]),
            power: 3,
        })
        .unwrap();
        assert_eq!(core.registry().total_power(), 6);
        assert_eq!(core.required(), 4);
    }

    #[test]
    fn invalid_ratio_leaves_policy() {
        let mut core = core();
        let result = core.apply(Amendment::SetConsensus {
            numerator: 3,
            denominator: 0,
        });
        assert!(matches!(result, Err(GovernanceError::InvalidRatio { .. })));
        assert_eq!(core.policy(), ConsensusPolicy::TWO_THIRDS);
    }

    #[test]
    fn validators_batch() {
        let mut core = core();
        core.apply(Amendment::UpdateValidators {
            principals: vec![Address::new([1; 20]), Address::new([9; 20])],
            flags: vec![false, true],
        })
        .unwrap();
        assert!(!core.registry().is_member(&Address::new([1; 20])));
        assert!(core.registry().is_member(&Address::new([9; 20])));
        assert_eq!(core.registry().total_power(), 3);
    }
}
