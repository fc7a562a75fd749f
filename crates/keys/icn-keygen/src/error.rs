use icn_delegation::DelegationError;
use icn_keyring::KeyringError;
use thiserror::Error;

use crate::keygen::KeyGenState;

/// Failure of a key generation capability.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerateError {
    #[error("entropy source failure: {0}")]
    Entropy(String),

    #[error("{0}")]
    Failed(String),
}

/// Errors from a key issuance run, by stage.
///
/// Each stage variant carries the collaborator's error untouched.
#[derive(Debug, Error)]
pub enum KeyGenError {
    #[error("key generation failed: {0}")]
    Generation(#[from] GenerateError),

    #[error("failed to persist generated key: {0}")]
    Persistence(#[from] KeyringError),

    #[error("failed to publish key delegation: {0}")]
    Delegation(#[from] DelegationError),

    #[error("cannot {op} while key generation is {state}")]
    InvalidState { op: &'static str, state: KeyGenState },
}
