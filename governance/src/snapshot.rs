//! Serializable engine state. Live target objects are not part of it.

use serde::{Deserialize, Serialize};

use crate::authority::GovernanceCore;
use crate::domain::SigningDomain;
use crate::ledger::VotingLedger;
use crate::replay::ReplayGuard;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffchainSnapshot {
    pub core: GovernanceCore,
    pub replay: ReplayGuard,
    pub domain: SigningDomain,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnchainSnapshot {
    pub core: GovernanceCore,
    pub ledger: VotingLedger,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineSnapshot {
    Offchain(OffchainSnapshot),
    Onchain(OnchainSnapshot),
}
