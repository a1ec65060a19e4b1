use concord_crypto::CryptoError;
use concord_types::{Address, Nonce, Power, TxId};
use thiserror::Error;

use crate::codec::CodecError;
use crate::target::TargetError;

/// Every rejection leaves registry, policy, replay guard and ledger untouched.
#[derive(Debug, Error)]
pub enum GovernanceError {
    #[error("nonce mismatch: expected {expected}, got {actual}")]
    NonceMismatch { expected: Nonce, actual: Nonce },

    #[error("identifier {0} was already consumed")]
    IdentifierReplay(u64),

    #[error("invalid signature at position {index}: {source}")]
    InvalidSignature {
        index: usize,
        #[source]
        source: CryptoError,
    },

    #[error("invalid arrangement: signer at position {index} is not strictly greater than its predecessor")]
    InvalidArrangement { index: usize },

    #[error("insufficient consensus: {have} < {need} power")]
    InsufficientConsensus { have: Power, need: Power },

    #[error("consensus not achieved: {have} < {need} votes")]
    ConsensusNotAchieved { have: u64, need: Power },

    #[error("{principal} already confirmed transaction {id}")]
    AlreadyConfirmed { id: TxId, principal: Address },

    #[error("transaction {0} was already executed")]
    AlreadyExecuted(TxId),

    #[error("transaction {0} not found")]
    TransactionNotFound(TxId),

    #[error("invalid ratio {numerator}/{denominator}")]
    InvalidRatio { numerator: u64, denominator: u64 },

    #[error("{0} has no governing power")]
    Unauthorized(Address),

    #[error("length mismatch: {principals} principals, {flags} flags")]
    LengthMismatch { principals: usize, flags: usize },

    #[error("equal-weight engine cannot grant {principal} power {power}")]
    WeightedPower { principal: Address, power: Power },

    #[error("total power overflow")]
    PowerOverflow,

    #[error("malformed payload: {0}")]
    MalformedPayload(#[from] CodecError),

    #[error("call to {target} failed: {source}")]
    CallFailed {
        target: Address,
        #[source]
        source: TargetError,
    },

    #[error("corrupt snapshot: {0}")]
    CorruptSnapshot(String),

    #[error("config error: {0}")]
    Config(String),
}
