//! Actions and the self-amendment variants they decode into.
//!
//! An action is opaque call data aimed at a target. When the target is the
//! engine's own address the payload must decode to an [`Amendment`]; any
//! other target receives the payload unchanged.

use concord_types::{Address, Power};
use serde::{Deserialize, Serialize};

use crate::codec::{split_selector, ArgReader, CallEncoder, CodecError};
use crate::error::GovernanceError;

pub const UPDATE_POWER: &str = "updatePower(address,uint256)";
pub const UPDATE_VALIDATORS: &str = "updateValidators(address[],bool[])";
pub const SET_CONSENSUS: &str = "setConsensus(uint256,uint256)";

/// A governed call: where it goes, what value it carries, and its call data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub target: Address,
    pub value: u128,
    pub payload: Vec<u8>,
}

impl Action {
    pub fn new(target: Address, payload: Vec<u8>) -> Self {
        Self {
            target,
            value: 0,
            payload,
        }
    }

    pub fn with_value(target: Address, value: u128, payload: Vec<u8>) -> Self {
        Self {
            target,
            value,
            payload,
        }
    }
}

/// Mutations the engine may apply to its own rules.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Amendment {
    UpdatePower { principal: Address, power: Power },
    UpdateValidators { principals: Vec<Address>, flags: Vec<bool> },
    SetConsensus { numerator: u64, denominator: u64 },
}

impl Amendment {
    /// ABI call data for this amendment.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Amendment::UpdatePower { principal, power } => CallEncoder::new(UPDATE_POWER, 2)
                .address(principal)
                .uint(*power)
                .finish(),
            Amendment::UpdateValidators { principals, flags } => {
                CallEncoder::new(UPDATE_VALIDATORS, 2)
                    .address_array(principals)
                    .bool_array(flags)
                    .finish()
            }
            Amendment::SetConsensus {
                numerator,
                denominator,
            } => CallEncoder::new(SET_CONSENSUS, 2)
                .uint(u128::from(*numerator))
                .uint(u128::from(*denominator))
                .finish(),
        }
    }

    pub fn decode(payload: &[u8]) -> Result<Self, CodecError> {
        let (selector, args) = split_selector(payload)?;
        let reader = ArgReader::new(args);
        if selector == crate::codec::selector(UPDATE_POWER) {
            Ok(Amendment::UpdatePower {
                principal: reader.address(0)?,
                power: reader.uint128(1)?,
            })
        } else if selector == crate::codec::selector(UPDATE_VALIDATORS) {
            Ok(Amendment::UpdateValidators {
                principals: reader.address_array(0)?,
                flags: reader.bool_array(1)?,
            })
        } else if selector == crate::codec::selector(SET_CONSENSUS) {
            Ok(Amendment::SetConsensus {
                numerator: reader.uint64(0)?,
                denominator: reader.uint64(1)?,
            })
        } else {
            Err(CodecError::UnknownSelector(selector))
        }
    }
}

/// An action resolved against the engine that runs it.
#[derive(Debug, PartialEq, Eq)]
pub enum Operation<'a> {
    Call {
        target: Address,
        value: u128,
        payload: &'a [u8],
    },
    Amend(Amendment),
}

impl<'a> Operation<'a> {
    /// Decode once: calls aimed at `engine` become amendments.
    pub fn decode(engine: &Address, action: &'a Action) -> Result<Self, GovernanceError> {
        if action.target == *engine {
            return Ok(Operation::Amend(Amendment::decode(&action.payload)?));
        }
        Ok(Operation::Call {
            target: action.target,
            value: action.value,
            payload: &action.payload,
        })
    }
}
