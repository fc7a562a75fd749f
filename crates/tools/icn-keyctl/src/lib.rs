//! `icn-keyctl`: issue and inspect identity keys against a local sled store.

pub mod commands;
pub mod config;
pub mod sled_storage;

pub use commands::{Issued, Keyctl, Listing};
pub use config::KeyctlConfig;
pub use sled_storage::SledStorage;
