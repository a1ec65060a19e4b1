//! Carries out authorized actions.

use crate::action::{Action, Operation};
use crate::authority::GovernanceCore;
use crate::error::GovernanceError;
use crate::target::{CallContext, TargetRegistry};

/// Runs actions once authorization has succeeded, without further checks.
///
/// Self-amendments are applied to the engine's core; every other call is
/// dispatched to the registered target with the engine as caller.
#[derive(Debug, Default)]
pub struct GovernedExecutor {
    targets: TargetRegistry,
}

impl GovernedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_targets(targets: TargetRegistry) -> Self {
        Self { targets }
    }

    pub fn targets(&self) -> &TargetRegistry {
        &self.targets
    }

    pub fn targets_mut(&mut self) -> &mut TargetRegistry {
        &mut self.targets
    }

    pub fn perform(
        &mut self,
        core: &mut GovernanceCore,
        action: &Action,
    ) -> Result<Vec<u8>, GovernanceError> {
        match Operation::decode(&core.address(), action)? {
            Operation::Amend(amendment) => {
                core.apply(amendment)?;
                Ok(Vec::new())
            }
            Operation::Call {
                target,
                value,
                payload,
            } => {
                let Some(contract) = self.targets.get_dyn_mut(&target) else {
                    tracing::warn!(%target, value, "no target registered at address, call has no effect");
                    return Ok(Vec::new());
                };
                let ctx = CallContext {
                    caller: core.address(),
                    value,
                };
                contract
                    .perform(ctx, payload)
                    .map_err(|source| GovernanceError::CallFailed { target, source })
            }
        }
    }
}
