//! Local keyring for generated secret keys.
//!
//! Secret keys are written as [`SkbPacket`]s (secret key bundles) into an
//! [`SkbStore`]. Two [`KeyringPersistence`] policies decide how the secret is
//! protected: [`PlainKeyring`] stores it as-is, [`LksKeyring`] seals it with a
//! [`LocalKeySecurity`] context first.

#![forbid(unsafe_code)]

pub mod error;
pub mod lks;
pub mod persist;
pub mod skb;
pub mod store;

pub use error::KeyringError;
pub use lks::{LksParams, LocalKeySecurity};
pub use persist::{KeyringPersistence, LksKeyring, PlainKeyring};
pub use skb::{SecretBlob, SkbPacket};
pub use store::{MemoryKeyring, SkbStore, StoredKey};
