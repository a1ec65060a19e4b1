//! Nonce sequence guarding off-chain actions against replay.
//!
//! The identifier space is a single counter: every nonce below `next` has
//! been consumed, and only `next` itself is acceptable.

use concord_types::Nonce;
use serde::{Deserialize, Serialize};

use crate::error::GovernanceError;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayGuard {
    next: Nonce,
}

impl ReplayGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume a sequence whose first `next` nonces are already consumed.
    pub fn starting_at(next: Nonce) -> Self {
        Self { next }
    }

    /// The nonce the next action must carry.
    pub fn next(&self) -> Nonce {
        self.next
    }

    pub fn is_consumed(&self, nonce: Nonce) -> bool {
        nonce < self.next
    }

    /// Reject any nonce other than the next expected one, stale or future alike.
    pub fn check(&self, nonce: Nonce) -> Result<(), GovernanceError> {
        if nonce != self.next {
            return Err(GovernanceError::NonceMismatch {
                expected: self.next,
                actual: nonce,
            });
        }
        Ok(())
    }

    /// Consume `nonce`. Returns `false` when it is already consumed or is
    /// not the next in sequence.
    pub fn consume(&mut self, nonce: Nonce) -> bool {
        if nonce != self.next {
            return false;
        }
        match self.next.checked_add(1) {
            Some(next) => {
                self.next = next;
                true
            }
            None => false,
        }
    }
}
