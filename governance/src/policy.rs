//! Consensus ratio and the minimum power it demands.

use concord_types::Power;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::GovernanceError;

/// Fraction of total power required to authorize an action.
///
/// Always satisfies `denominator > 0` and `numerator <= denominator`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "(u64, u64)", into = "(u64, u64)")]
pub struct ConsensusPolicy {
    numerator: u64,
    denominator: u64,
}

impl ConsensusPolicy {
    /// Nothing required: every proposal passes on its first vote.
    pub const NONE: Self = Self {
        numerator: 0,
        denominator: 1,
    };

    /// At least two thirds of total power.
    pub const TWO_THIRDS: Self = Self {
        numerator: 2,
        denominator: 3,
    };

    pub fn new(numerator: u64, denominator: u64) -> Result<Self, GovernanceError> {
        if denominator == 0 || numerator > denominator {
            return Err(GovernanceError::InvalidRatio {
                numerator,
                denominator,
            });
        }
        Ok(Self {
            numerator,
            denominator,
        })
    }

    /// `(numerator, denominator)`.
    pub fn ratio(&self) -> (u64, u64) {
        (self.numerator, self.denominator)
    }

    /// `ceil(total_power * numerator / denominator)`, computed without overflow.
    ///
    /// Never exceeds `total_power`.
    pub fn required(&self, total_power: Power) -> Power {
        let n = Power::from(self.numerator);
        let d = Power::from(self.denominator);
        let whole = total_power / d;
        let rest = total_power % d;
        whole * n + (rest * n).div_ceil(d)
    }
}

impl Default for ConsensusPolicy {
    fn default() -> Self {
        Self::TWO_THIRDS
    }
}

impl TryFrom<(u64, u64)> for ConsensusPolicy {
    type Error = GovernanceError;

    fn try_from((numerator, denominator): (u64, u64)) -> Result<Self, Self::Error> {
        Self::new(numerator, denominator)
    }
}

impl From<ConsensusPolicy> for (u64, u64) {
    fn from(policy: ConsensusPolicy) -> Self {
        policy.ratio()
    }
}

impl fmt::Display for ConsensusPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}
