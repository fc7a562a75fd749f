use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use sled::transaction::{abort, TransactionError};
use sled::Db;
use std::path::Path;

use icn_identity::{ChainTail, Identity, Kid};
use icn_keyring::{KeyringError, LocalKeySecurity, SkbPacket, SkbStore, StoredKey};
use icn_types::chain_store::check_extends;
use icn_types::{ChainError, ChainLink, ChainStore};

/// A persistent keyring and chain store using the Sled embedded database.
pub struct SledStorage {
    db: Db,
}

impl SledStorage {
    /// Opens or creates a Sled database at the specified path.
    pub fn open(path: &Path) -> Result<Self> {
        tracing::info!("Opening Sled database at: {:?}", path);
        let db = sled::open(path).context(format!("Failed to open sled database at {:?}", path))?;
        Ok(Self { db })
    }

    pub async fn flush(&self) -> Result<()> {
        self.db.flush_async().await?;
        Ok(())
    }

    // Helper to generate keys with prefixes
    fn identity_key(name: &str) -> String {
        format!("identity:{}", name)
    }

    fn salt_key(name: &str) -> String {
        format!("lks-salt:{}", name)
    }

    fn skb_prefix(name: &str) -> String {
        format!("skb:{}:", name)
    }

    fn skb_key(name: &str, kid: &Kid) -> String {
        format!("skb:{}:{}", name, kid)
    }

    fn tail_key(name: &str) -> String {
        format!("tail:{}", name)
    }

    fn link_prefix(name: &str) -> String {
        format!("chain:{}:", name)
    }

    // Zero-padded so a prefix scan yields links in seqno order.
    fn link_key(name: &str, seqno: u64) -> String {
        format!("chain:{}:{:020}", name, seqno)
    }

    /// Register a new identity. Fails if `name` is already taken.
    pub fn create_identity(&self, name: &str) -> Result<Identity> {
        let identity = Identity::new(name);
        let bytes = serde_cbor::to_vec(&identity).context("Failed to serialize identity")?;
        let key = Self::identity_key(name);
        tracing::debug!(key = %key, uid = %identity.uid, "Creating identity");
        self.db
            .compare_and_swap(&key, None as Option<&[u8]>, Some(bytes))?
            .map_err(|_| anyhow!("Identity {} already exists", name))?;
        Ok(identity)
    }

    /// The identity as of its current chain tail.
    pub async fn load_identity(&self, name: &str) -> Result<Option<Identity>> {
        let key = Self::identity_key(name);
        let Some(bytes) = self.db.get(&key)? else {
            return Ok(None);
        };
        let identity: Identity =
            serde_cbor::from_slice(&bytes).context("Failed to deserialize identity")?;
        let tail = self.tail(name).await?;
        Ok(Some(identity.with_tail(tail)))
    }

    /// Salt for deriving `name`'s local key security secret, created on first use.
    pub fn lks_salt(&self, name: &str) -> Result<Vec<u8>> {
        let key = Self::salt_key(name);
        let fresh = LocalKeySecurity::generate_salt();
        match self.db.compare_and_swap(&key, None as Option<&[u8]>, Some(&fresh[..]))? {
            Ok(()) => {
                tracing::debug!(key = %key, "Stored new LKS salt");
                Ok(fresh.to_vec())
            }
            Err(existing) => existing
                .current
                .map(|salt| salt.to_vec())
                .ok_or_else(|| anyhow!("LKS salt for {} vanished", name)),
        }
    }
}

fn keyring_backend(e: sled::Error) -> KeyringError {
    KeyringError::Backend(e.to_string())
}

fn chain_backend(e: sled::Error) -> ChainError {
    ChainError::Backend(e.to_string())
}

#[async_trait]
impl SkbStore for SledStorage {
    async fn put(&self, name: &str, packet: SkbPacket) -> Result<StoredKey, KeyringError> {
        let key = Self::skb_key(name, &packet.kid);
        let bytes = packet.encode()?;
        tracing::debug!(key = %key, bytes = bytes.len(), "Storing secret key bundle");
        self.db.insert(key.as_bytes(), bytes).map_err(keyring_backend)?;
        Ok(StoredKey {
            name: name.to_string(),
            kid: packet.kid,
            locator: format!("sled:{}", key),
        })
    }

    async fn get(&self, name: &str, kid: &Kid) -> Result<Option<SkbPacket>, KeyringError> {
        let key = Self::skb_key(name, kid);
        self.db
            .get(key.as_bytes())
            .map_err(keyring_backend)?
            .map(|bytes| SkbPacket::decode(&bytes))
            .transpose()
    }

    async fn list(&self, name: &str) -> Result<Vec<SkbPacket>, KeyringError> {
        self.db
            .scan_prefix(Self::skb_prefix(name).as_bytes())
            .map(|entry| -> Result<SkbPacket, KeyringError> {
                let (_, bytes) = entry.map_err(keyring_backend)?;
                SkbPacket::decode(&bytes)
            })
            .collect()
    }

    async fn remove(&self, name: &str, kid: &Kid) -> Result<(), KeyringError> {
        let key = Self::skb_key(name, kid);
        tracing::debug!(key = %key, "Removing secret key bundle");
        self.db.remove(key.as_bytes()).map_err(keyring_backend)?;
        Ok(())
    }
}

#[async_trait]
impl ChainStore for SledStorage {
    async fn tail(&self, name: &str) -> Result<Option<ChainTail>, ChainError> {
        match self
            .db
            .get(Self::tail_key(name).as_bytes())
            .map_err(chain_backend)?
        {
            Some(bytes) => Ok(Some(serde_cbor::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn append(&self, name: &str, link: ChainLink) -> Result<ChainTail, ChainError> {
        let new_tail = ChainTail {
            seqno: link.seqno,
            link_id: link.cid()?.to_string(),
        };
        let tail_key = Self::tail_key(name);
        let link_key = Self::link_key(name, link.seqno);
        let link_bytes = serde_cbor::to_vec(&link)?;
        let tail_bytes = serde_cbor::to_vec(&new_tail)?;

        // Tail check and both writes commit together or not at all.
        let res = self.db.transaction(|tx| {
            let tail = match tx.get(tail_key.as_bytes())? {
                Some(bytes) => match serde_cbor::from_slice::<ChainTail>(&bytes) {
                    Ok(tail) => Some(tail),
                    Err(e) => return abort(ChainError::from(e)),
                },
                None => None,
            };
            if let Err(e) = check_extends(name, tail.as_ref(), &link) {
                return abort(e);
            }
            tx.insert(link_key.as_bytes(), link_bytes.clone())?;
            tx.insert(tail_key.as_bytes(), tail_bytes.clone())?;
            Ok(())
        });

        match res {
            Ok(()) => {
                tracing::debug!(name = %name, seqno = new_tail.seqno, link_id = %new_tail.link_id, "Appended chain link");
                Ok(new_tail)
            }
            Err(TransactionError::Abort(e)) => Err(e),
            Err(TransactionError::Storage(e)) => Err(chain_backend(e)),
        }
    }

    async fn get(&self, name: &str, seqno: u64) -> Result<Option<ChainLink>, ChainError> {
        match self
            .db
            .get(Self::link_key(name, seqno).as_bytes())
            .map_err(chain_backend)?
        {
            Some(bytes) => Ok(Some(serde_cbor::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn links(&self, name: &str) -> Result<Vec<ChainLink>, ChainError> {
        self.db
            .scan_prefix(Self::link_prefix(name).as_bytes())
            .map(|entry| -> Result<ChainLink, ChainError> {
                let (_, bytes) = entry.map_err(chain_backend)?;
                Ok(serde_cbor::from_slice(&bytes)?)
            })
            .collect()
    }
}
