use crate::sig::SigError;
use icn_identity::Kid;
use icn_types::ChainError;
use thiserror::Error;

/// Errors raised while building or publishing a delegation.
#[derive(Debug, Error)]
pub enum DelegationError {
    #[error("a signing key is required to delegate a sibkey or subkey")]
    MissingSigner,

    #[error("the eldest key id is required to delegate a sibkey or subkey")]
    MissingEldestKid,

    #[error("eldest link must name the new key {expected} as eldest, got {found}")]
    EldestKidMismatch { expected: Kid, found: Kid },

    #[error("reverse signature is missing")]
    MissingReverseSig,

    #[error("reverse signature does not verify against the delegated key")]
    InvalidReverseSig,

    #[error("statement does not match its chain link: {0}")]
    InvalidStatement(String),

    #[error("chain tail is not a valid link id: {0}")]
    InvalidPrev(String),

    #[error("failed to serialize delegation statement: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("statement signature error: {0}")]
    Signature(#[from] SigError),

    #[error("chain error: {0}")]
    Chain(#[from] ChainError),

    /// Refusal reported by a [`DelegationPublisher`](crate::DelegationPublisher)
    /// implemented outside this crate, e.g. a remote chain service. `ChainDelegator`
    /// reports its own failures through the variants above.
    #[error("delegation rejected: {0}")]
    Rejected(String),
}
