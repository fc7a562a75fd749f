//! Issue a new key for an identity and bind it into the identity's chain.
//!
//! [`KeyGen`] drives three collaborators in a fixed order:
//!
//! 1. a [`KeyGenerator`] produces the keypair,
//! 2. a keyring policy (plain or local key security) persists it,
//! 3. a [`DelegationPublisher`](icn_delegation::DelegationPublisher) signs and
//!    publishes the statement authorizing it, returning a
//!    [`ChainReceipt`](icn_types::ChainReceipt).
//!
//! A failed stage leaves every earlier stage's result in place. In particular a
//! key that was persisted but not published stays in the keyring; the caller can
//! correct the delegation metadata with [`KeyGen::update_arg`] and push again.

#![forbid(unsafe_code)]

pub mod arg;
pub mod error;
pub mod generator;
pub mod keygen;

pub use arg::{KeyGenArg, DEFAULT_EXPIRE_IN};
pub use error::{GenerateError, KeyGenError};
pub use generator::{Ed25519Generator, KeyGenerator};
pub use keygen::{KeyGen, KeyGenState};
