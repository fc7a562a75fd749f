//! The two ways a freshly generated key reaches the keyring.

use icn_identity::KeyPair;
use icn_types::Notifier;

use crate::error::KeyringError;
use crate::lks::LocalKeySecurity;
use crate::skb::SkbPacket;
use crate::store::{SkbStore, StoredKey};

/// Durably store a keypair for the identity called `name`.
#[async_trait::async_trait]
pub trait KeyringPersistence: Send + Sync {
    async fn persist(
        &self,
        name: &str,
        pair: &KeyPair,
        notifier: &dyn Notifier,
    ) -> Result<StoredKey, KeyringError>;
}

/// Writes the secret key unprotected.
pub struct PlainKeyring<'a> {
    store: &'a dyn SkbStore,
}

impl<'a> PlainKeyring<'a> {
    pub fn new(store: &'a dyn SkbStore) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl<'a> KeyringPersistence for PlainKeyring<'a> {
    async fn persist(
        &self,
        name: &str,
        pair: &KeyPair,
        notifier: &dyn Notifier,
    ) -> Result<StoredKey, KeyringError> {
        notifier.report(&format!("Writing out new key {} to the keyring", pair.kid));
        let stored = self.store.put(name, SkbPacket::plain(pair)).await?;
        tracing::debug!(name = %name, kid = %pair.kid, locator = %stored.locator, "Stored plain key bundle");
        Ok(stored)
    }
}

/// Seals the secret key with a local key security context before writing it.
pub struct LksKeyring<'a> {
    store: &'a dyn SkbStore,
    lks: &'a LocalKeySecurity,
}

impl<'a> LksKeyring<'a> {
    pub fn new(store: &'a dyn SkbStore, lks: &'a LocalKeySecurity) -> Self {
        Self { store, lks }
    }
}

#[async_trait::async_trait]
impl<'a> KeyringPersistence for LksKeyring<'a> {
    async fn persist(
        &self,
        name: &str,
        pair: &KeyPair,
        notifier: &dyn Notifier,
    ) -> Result<StoredKey, KeyringError> {
        notifier.report(&format!(
            "Writing out new key {} to the keyring (local key security generation {})",
            pair.kid,
            self.lks.generation()
        ));
        let packet = SkbPacket::sealed(pair, self.lks)?;
        let stored = self.store.put(name, packet).await?;
        tracing::debug!(name = %name, kid = %pair.kid, locator = %stored.locator, "Stored LKS key bundle");
        Ok(stored)
    }
}
