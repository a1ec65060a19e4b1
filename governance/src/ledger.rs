//! Vote records for on-chain proposals.
//!
//! Each record moves `Proposed -> (Confirmed)* -> Executed` and never leaves
//! `Executed`. Ids are positions in the ledger, so they are dense and
//! assigned in submission order.

use concord_types::{Address, TxId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::action::Action;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    action: Action,
    proposer: Address,
    confirmed_by: BTreeSet<Address>,
    executed: bool,
}

impl VoteRecord {
    fn new(action: Action, proposer: Address) -> Self {
        Self {
            action,
            proposer,
            confirmed_by: BTreeSet::from([proposer]),
            executed: false,
        }
    }

    pub fn action(&self) -> &Action {
        &self.action
    }

    pub fn proposer(&self) -> &Address {
        &self.proposer
    }

    /// Head count of confirmations, the proposer included.
    pub fn votes(&self) -> u64 {
        self.confirmed_by.len() as u64
    }

    pub fn confirmed_by(&self) -> impl Iterator<Item = &Address> {
        self.confirmed_by.iter()
    }

    pub fn has_confirmed(&self, principal: &Address) -> bool {
        self.confirmed_by.contains(principal)
    }

    pub fn is_executed(&self) -> bool {
        self.executed
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingLedger {
    records: Vec<VoteRecord>,
}

impl VotingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id the next proposal will receive.
    pub fn next_id(&self) -> TxId {
        self.records.len() as TxId
    }

    pub fn get(&self, id: TxId) -> Option<&VoteRecord> {
        usize::try_from(id).ok().and_then(|i| self.records.get(i))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TxId, &VoteRecord)> {
        self.records
            .iter()
            .enumerate()
            .map(|(i, record)| (i as TxId, record))
    }

    /// Record a proposal with its proposer as the first vote.
    pub(crate) fn push(&mut self, action: Action, proposer: Address, executed: bool) -> TxId {
        let id = self.next_id();
        let mut record = VoteRecord::new(action, proposer);
        record.executed = executed;
        self.records.push(record);
        id
    }

    /// Add a vote. Returns `false` if the principal had already voted.
    pub(crate) fn record_vote(&mut self, id: TxId, principal: Address) -> bool {
        self.get_mut(id)
            .is_some_and(|record| record.confirmed_by.insert(principal))
    }

    pub(crate) fn mark_executed(&mut self, id: TxId) {
        if let Some(record) = self.get_mut(id) {
            record.executed = true;
        }
    }

    fn get_mut(&mut self, id: TxId) -> Option<&mut VoteRecord> {
        usize::try_from(id).ok().and_then(|i| self.records.get_mut(i))
    }
}
