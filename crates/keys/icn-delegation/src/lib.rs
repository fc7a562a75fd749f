//! Key delegation: the signed statement that authorizes a new key for an
//! identity, and the publisher that appends it to the identity's chain.

#![forbid(unsafe_code)]

pub mod delegator;
pub mod error;
pub mod request;
pub mod sig;
pub mod statement;

pub use delegator::ChainDelegator;
pub use error::DelegationError;
pub use request::{DelegationPublisher, DelegationRequest};
pub use sig::{sign_statement, verify_statement, SigError};
pub use statement::{reverse_sign, verify_link, DelegationStatement, LinkKind, ReverseClaim, StatementIdentity};
