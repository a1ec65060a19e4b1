//! Threshold authorization for governed contracts.
//!
//! A set of principals, each holding some power, authorizes actions once
//! their combined power reaches a fraction of the total. Two modes share the
//! same membership and policy state:
//!
//! - **Off-chain** ([`OffchainGovernance`]): principals sign a digest of
//!   `(nonce, target, payload)` and anyone submits the action with the
//!   signatures, strictly ascending by signer address.
//! - **On-chain** ([`OnchainGovernance`]): a governor proposes, others
//!   confirm one at a time, and the action runs as soon as the head count
//!   meets the threshold.
//!
//! Membership and the ratio change only through the engine itself: an
//! authorized action whose target is the engine's own address carries an
//! [`Amendment`].

pub mod action;
pub mod authority;
pub mod authorizer;
pub mod codec;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod executor;
pub mod ledger;
pub mod offchain;
pub mod onchain;
pub mod policy;
pub mod registry;
pub mod replay;
pub mod snapshot;
pub mod target;
pub mod text_store;

pub use action::{Action, Amendment, Operation};
pub use authority::{Authority, GovernanceCore};
pub use authorizer::{SignatureAuthorizer, Tally};
pub use codec::CodecError;
pub use config::{GovernanceConfig, GovernanceMode, MemberConfig};
pub use domain::{domain_separator, SigningDomain, PREFIX};
pub use engine::GovernanceEngine;
pub use error::GovernanceError;
pub use executor::GovernedExecutor;
pub use ledger::{VoteRecord, VotingLedger};
pub use offchain::OffchainGovernance;
pub use onchain::{OnchainGovernance, VoteStatus};
pub use policy::ConsensusPolicy;
pub use registry::MembershipRegistry;
pub use replay::ReplayGuard;
pub use snapshot::{EngineSnapshot, OffchainSnapshot, OnchainSnapshot};
pub use target::{CallContext, GovernedTarget, TargetError, TargetRegistry};
pub use text_store::TextStore;
