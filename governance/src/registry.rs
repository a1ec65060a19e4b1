//! Principal → power registry with an incrementally maintained total.
//!
//! Principals with zero power are dropped from the map, so "absent" and
//! "zero" read the same. The total is adjusted by the delta on every
//! mutation and never recomputed from scratch.

use concord_types::{Address, Power};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::GovernanceError;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipRegistry {
    /// principal → power, only nonzero entries.
    powers: BTreeMap<Address, Power>,
    /// Current members in the order they were (last) granted power.
    order: Vec<Address>,
    /// Sum of all powers.
    total_power: Power,
}

impl MembershipRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from parallel principal/power lists.
    pub fn from_members(principals: &[Address], powers: &[Power]) -> Result<Self, GovernanceError> {
        if principals.len() != powers.len() {
            return Err(GovernanceError::LengthMismatch {
                principals: principals.len(),
                flags: powers.len(),
            });
        }
        let mut registry = Self::new();
        for (principal, power) in principals.iter().zip(powers) {
            registry.update_power(*principal, *power)?;
        }
        Ok(registry)
    }

    /// Power of a principal. Returns 0 if unknown.
    pub fn power_of(&self, principal: &Address) -> Power {
        self.powers.get(principal).copied().unwrap_or(0)
    }

    /// Sum of all current powers.
    pub fn total_power(&self) -> Power {
        self.total_power
    }

    /// Whether the principal currently holds nonzero power.
    pub fn is_member(&self, principal: &Address) -> bool {
        self.powers.contains_key(principal)
    }

    /// Current members in grant order.
    pub fn members(&self) -> &[Address] {
        &self.order
    }

    /// Number of principals with nonzero power.
    pub fn member_count(&self) -> usize {
        self.order.len()
    }

    /// Set a principal's power, adjusting the total by the delta.
    ///
    /// Returns the previous power. Setting 0 revokes membership.
    pub fn update_power(
        &mut self,
        principal: Address,
        new_power: Power,
    ) -> Result<Power, GovernanceError> {
        let old_power = self.power_of(&principal);
        let total = (self.total_power - old_power)
            .checked_add(new_power)
            .ok_or(GovernanceError::PowerOverflow)?;

        match (old_power, new_power) {
            (0, 0) => {}
            (0, _) => {
                self.powers.insert(principal, new_power);
                self.order.push(principal);
            }
            (_, 0) => {
                self.powers.remove(&principal);
                self.order.retain(|p| *p != principal);
            }
            _ => {
                self.powers.insert(principal, new_power);
            }
        }
        self.total_power = total;
        Ok(old_power)
    }

    /// Batched boolean-membership update: `true` grants power 1, `false` revokes.
    ///
    /// Entries are applied in order; the whole batch is rejected if the
    /// lists differ in length or any step would overflow.
    pub fn update_many(
        &mut self,
        principals: &[Address],
        flags: &[bool],
    ) -> Result<(), GovernanceError> {
        if principals.len() != flags.len() {
            return Err(GovernanceError::LengthMismatch {
                principals: principals.len(),
                flags: flags.len(),
            });
        }
        let mut next = self.clone();
        for (principal, flag) in principals.iter().zip(flags) {
            next.update_power(*principal, Power::from(*flag))?;
        }
        *self = next;
        Ok(())
    }

    /// Check that the stored total matches the sum of powers and that the
    /// grant order lists exactly the current members.
    pub fn is_consistent(&self) -> bool {
        let sum = self
            .powers
            .values()
            .try_fold(0u128, |acc, p| acc.checked_add(*p));
        sum == Some(self.total_power)
            && self.order.len() == self.powers.len()
            && self.order.iter().all(|p| self.powers.contains_key(p))
            && self.powers.values().all(|p| *p > 0)
    }
}
