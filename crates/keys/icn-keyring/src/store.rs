use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

use icn_identity::Kid;

use crate::error::KeyringError;
use crate::skb::SkbPacket;

/// Handle to a bundle that has been written to a keyring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredKey {
    pub name: String,
    pub kid: Kid,
    /// Backend-specific location of the bundle.
    pub locator: String,
}

/// Storage backend for secret key bundles, keyed by identity name and key id.
#[async_trait::async_trait]
pub trait SkbStore: Send + Sync {
    async fn put(&self, name: &str, packet: SkbPacket) -> Result<StoredKey, KeyringError>;

    async fn get(&self, name: &str, kid: &Kid) -> Result<Option<SkbPacket>, KeyringError>;

    /// All bundles stored for `name`.
    async fn list(&self, name: &str) -> Result<Vec<SkbPacket>, KeyringError>;

    async fn remove(&self, name: &str, kid: &Kid) -> Result<(), KeyringError>;
}

/// In-memory keyring. Bundles are held in their encoded form, exactly as a
/// durable backend would hold them.
#[derive(Clone, Default)]
pub struct MemoryKeyring {
    inner: Arc<RwLock<HashMap<String, BTreeMap<Kid, Vec<u8>>>>>,
}

impl MemoryKeyring {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl SkbStore for MemoryKeyring {
    async fn put(&self, name: &str, packet: SkbPacket) -> Result<StoredKey, KeyringError> {
        let bytes = packet.encode()?;
        let mut map = self.inner.write().await;
        map.entry(name.to_string())
            .or_default()
            .insert(packet.kid.clone(), bytes);
        Ok(StoredKey {
            name: name.to_string(),
            locator: format!("memory:{}/{}", name, packet.kid),
            kid: packet.kid,
        })
    }

    async fn get(&self, name: &str, kid: &Kid) -> Result<Option<SkbPacket>, KeyringError> {
        let map = self.inner.read().await;
        map.get(name)
            .and_then(|keys| keys.get(kid))
            .map(|bytes| SkbPacket::decode(bytes))
            .transpose()
    }

    async fn list(&self, name: &str) -> Result<Vec<SkbPacket>, KeyringError> {
        let map = self.inner.read().await;
        map.get(name)
            .map(|keys| keys.values().map(|b| SkbPacket::decode(b)).collect())
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn remove(&self, name: &str, kid: &Kid) -> Result<(), KeyringError> {
        let mut map = self.inner.write().await;
        if let Some(keys) = map.get_mut(name) {
            keys.remove(kid);
        }
        Ok(())
    }
}
