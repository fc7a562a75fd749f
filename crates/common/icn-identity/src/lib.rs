//! ICN Identity – key identifiers, keypairs and identity snapshots for the key chain.
//!
//! - `Kid` names an Ed25519 public key (`multicodec: 0xED`, `multibase: base58btc`).
//! - `KeyPair` wraps an Ed25519 signing key together with its `Kid`.
//! - `Identity` is a point-in-time snapshot of a user and the head of their signature chain.
//! - Zero `unsafe`; `#![forbid(unsafe_code)]`.

#![forbid(unsafe_code)]

mod identity;
mod keypair;
mod kid;

pub use identity::{ChainTail, Device, DeviceKind, Identity};
pub use keypair::{KeyPair, Signature};
pub use kid::{Kid, KidError};
