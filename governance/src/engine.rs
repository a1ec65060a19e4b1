//! Either engine mode behind one type, for callers that load whichever
//! mode a state file holds.

use crate::authority::Authority;
use crate::error::GovernanceError;
use crate::executor::GovernedExecutor;
use crate::offchain::OffchainGovernance;
use crate::onchain::OnchainGovernance;
use crate::snapshot::EngineSnapshot;

#[derive(Debug)]
pub enum GovernanceEngine {
    Offchain(OffchainGovernance),
    Onchain(OnchainGovernance),
}

impl GovernanceEngine {
    pub fn from_snapshot(
        snapshot: EngineSnapshot,
        executor: GovernedExecutor,
    ) -> Result<Self, GovernanceError> {
        Ok(match snapshot {
            EngineSnapshot::Offchain(s) => {
                Self::Offchain(OffchainGovernance::from_snapshot(s, executor)?)
            }
            EngineSnapshot::Onchain(s) => {
                Self::Onchain(OnchainGovernance::from_snapshot(s, executor)?)
            }
        })
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        match self {
            Self::Offchain(engine) => EngineSnapshot::Offchain(engine.snapshot()),
            Self::Onchain(engine) => EngineSnapshot::Onchain(engine.snapshot()),
        }
    }

    pub fn authority(&self) -> &dyn Authority {
        match self {
            Self::Offchain(engine) => engine,
            Self::Onchain(engine) => engine,
        }
    }

    pub fn executor_mut(&mut self) -> &mut GovernedExecutor {
        match self {
            Self::Offchain(engine) => engine.executor_mut(),
            Self::Onchain(engine) => engine.executor_mut(),
        }
    }

    pub fn mode(&self) -> &'static str {
        match self {
            Self::Offchain(_) => "offchain",
            Self::Onchain(_) => "onchain",
        }
    }
}
