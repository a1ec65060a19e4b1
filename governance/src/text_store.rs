//! Owner-gated text store: the sample contract a governance engine owns.

use concord_types::Address;
use std::any::Any;

use crate::codec::{encode_string_return, split_selector, ArgReader, CallEncoder, CodecError};
use crate::target::{CallContext, GovernedTarget, TargetError};

pub const SET_TEXT: &str = "setText(string)";
pub const TRANSFER_OWNERSHIP: &str = "transferOwnership(address)";
pub const GET_TEXT: &str = "getText()";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextStore {
    owner: Address,
    text: String,
}

impl TextStore {
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            text: String::new(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn set_text(&mut self, caller: Address, text: String) -> Result<(), TargetError> {
        self.only_owner(caller)?;
        self.text = text;
        Ok(())
    }

    pub fn transfer_ownership(
        &mut self,
        caller: Address,
        new_owner: Address,
    ) -> Result<(), TargetError> {
        self.only_owner(caller)?;
        tracing::info!(from = %self.owner, to = %new_owner, "text store ownership transferred");
        self.owner = new_owner;
        Ok(())
    }

    fn only_owner(&self, caller: Address) -> Result<(), TargetError> {
        if caller != self.owner {
            return Err(TargetError::Unauthorized { caller });
        }
        Ok(())
    }

    /// Call data for `setText(string)`.
    pub fn set_text_call(text: &str) -> Vec<u8> {
        CallEncoder::new(SET_TEXT, 1).string(text).finish()
    }

    /// Call data for `transferOwnership(address)`.
    pub fn transfer_ownership_call(new_owner: &Address) -> Vec<u8> {
        CallEncoder::new(TRANSFER_OWNERSHIP, 1)
            .address(new_owner)
            .finish()
    }

    pub fn get_text_call() -> Vec<u8> {
        CallEncoder::new(GET_TEXT, 0).finish()
    }
}

impl GovernedTarget for TextStore {
    fn perform(&mut self, ctx: CallContext, payload: &[u8]) -> Result<Vec<u8>, TargetError> {
        let (selector, args) = split_selector(payload)?;
        let reader = ArgReader::new(args);
        if selector == crate::codec::selector(SET_TEXT) {
            self.set_text(ctx.caller, reader.string(0)?)?;
            Ok(Vec::new())
        } else if selector == crate::codec::selector(TRANSFER_OWNERSHIP) {
            self.transfer_ownership(ctx.caller, reader.address(0)?)?;
            Ok(Vec::new())
        } else if selector == crate::codec::selector(GET_TEXT) {
            Ok(encode_string_return(&self.text))
        } else {
            Err(CodecError::UnknownSelector(selector).into())
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
