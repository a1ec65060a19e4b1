//! The boundary between the engine and the contracts it governs.

use concord_types::Address;
use std::any::Any;
use std::collections::HashMap;
use thiserror::Error;

use crate::codec::CodecError;

/// Who is calling a target and with what value attached.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CallContext {
    pub caller: Address,
    pub value: u128,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TargetError {
    #[error("only owner allowed (caller {caller})")]
    Unauthorized { caller: Address },

    #[error("malformed call data: {0}")]
    Malformed(#[from] CodecError),

    #[error("reverted: {0}")]
    Reverted(String),
}

/// A contract that accepts call data once the engine has authorized it.
pub trait GovernedTarget: Any + Send {
    /// Run the call and return its ABI-encoded output.
    fn perform(&mut self, ctx: CallContext, payload: &[u8]) -> Result<Vec<u8>, TargetError>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Live target objects keyed by address.
#[derive(Default)]
pub struct TargetRegistry {
    targets: HashMap<Address, Box<dyn GovernedTarget>>,
}

impl TargetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a target, returning whatever was previously at `address`.
    pub fn register(
        &mut self,
        address: Address,
        target: Box<dyn GovernedTarget>,
    ) -> Option<Box<dyn GovernedTarget>> {
        self.targets.insert(address, target)
    }

    pub fn remove(&mut self, address: &Address) -> Option<Box<dyn GovernedTarget>> {
        self.targets.remove(address)
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.targets.contains_key(address)
    }

    /// Borrow the target at `address` as its concrete type.
    pub fn get<T: GovernedTarget>(&self, address: &Address) -> Option<&T> {
        self.targets.get(address)?.as_any().downcast_ref::<T>()
    }

    pub(crate) fn get_dyn_mut(&mut self, address: &Address) -> Option<&mut Box<dyn GovernedTarget>> {
        self.targets.get_mut(address)
    }

    pub fn get_mut<T: GovernedTarget>(&mut self, address: &Address) -> Option<&mut T> {
        self.targets.get_mut(address)?.as_any_mut().downcast_mut::<T>()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

impl std::fmt::Debug for TargetRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut addresses: Vec<_> = self.targets.keys().collect();
        addresses.sort();
        f.debug_struct("TargetRegistry")
            .field("targets", &addresses)
            .finish()
    }
}
