use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::chain::ChainLink;
use crate::error::ChainError;
use icn_identity::ChainTail;

/// Trait for per-identity signature chain storage.
///
/// Appends are compare-and-append: a link is only accepted if it extends the
/// tail the writer observed. Anything else is a [`ChainError::Conflict`].
#[async_trait::async_trait]
pub trait ChainStore: Send + Sync {
    /// Current tail of `name`'s chain, `None` for an empty chain.
    async fn tail(&self, name: &str) -> Result<Option<ChainTail>, ChainError>;

    /// Append `link` to `name`'s chain and return the new tail.
    async fn append(&self, name: &str, link: ChainLink) -> Result<ChainTail, ChainError>;

    /// Retrieve a link by sequence number.
    async fn get(&self, name: &str, seqno: u64) -> Result<Option<ChainLink>, ChainError>;

    /// All links of `name`'s chain, oldest first.
    async fn links(&self, name: &str) -> Result<Vec<ChainLink>, ChainError>;
}

/// Check that `link` extends `tail`. Shared by every `ChainStore` backend.
pub fn check_extends(
    name: &str,
    tail: Option<&ChainTail>,
    link: &ChainLink,
) -> Result<(), ChainError> {
    let expected_seqno = tail.map_or(1, |t| t.seqno + 1);
    let expected_prev = tail.map(|t| t.link_id.clone());
    let prev = link.prev_id();
    if link.seqno != expected_seqno || prev != expected_prev {
        return Err(ChainError::Conflict {
            name: name.to_string(),
            seqno: link.seqno,
            prev,
            tail: tail.cloned(),
        });
    }
    Ok(())
}

/// In-memory, async signature chain store.
///
/// `SharedChainStore` keeps every identity's chain behind one tokio `RwLock`,
/// so the tail check and the append happen under the same write guard.
///
/// # Example
/// ```
/// use icn_types::chain_store::{ChainStore, SharedChainStore};
///
/// #[tokio::main]
/// async fn main() {
///     let store = SharedChainStore::new();
///     assert_eq!(store.tail("alice").await.unwrap(), None);
///     assert!(store.links("alice").await.unwrap().is_empty());
/// }
/// ```
#[derive(Clone, Default)]
pub struct SharedChainStore {
    // identity name -> (link id, link), oldest first
    inner: Arc<RwLock<HashMap<String, Vec<(String, ChainLink)>>>>,
}

impl SharedChainStore {
    /// Create a new empty SharedChainStore
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ChainStore for SharedChainStore {
    async fn tail(&self, name: &str) -> Result<Option<ChainTail>, ChainError> {
        let map = self.inner.read().await;
        Ok(map.get(name).and_then(|chain| {
            chain.last().map(|(id, link)| ChainTail {
                seqno: link.seqno,
                link_id: id.clone(),
            })
        }))
    }

    async fn append(&self, name: &str, link: ChainLink) -> Result<ChainTail, ChainError> {
        let id = link.cid()?.to_string();
        let mut map = self.inner.write().await;
        let chain = map.entry(name.to_string()).or_default();

        let tail = chain.last().map(|(id, l)| ChainTail {
            seqno: l.seqno,
            link_id: id.clone(),
        });
        check_extends(name, tail.as_ref(), &link)?;

        tracing::debug!(name = %name, seqno = link.seqno, link_id = %id, "Appending chain link");
        let new_tail = ChainTail {
            seqno: link.seqno,
            link_id: id.clone(),
        };
        chain.push((id, link));
        Ok(new_tail)
    }

    async fn get(&self, name: &str, seqno: u64) -> Result<Option<ChainLink>, ChainError> {
        let map = self.inner.read().await;
        Ok(map
            .get(name)
            .and_then(|chain| chain.iter().find(|(_, l)| l.seqno == seqno))
            .map(|(_, l)| l.clone()))
    }

    async fn links(&self, name: &str) -> Result<Vec<ChainLink>, ChainError> {
        let map = self.inner.read().await;
        Ok(map
            .get(name)
            .map(|chain| chain.iter().map(|(_, l)| l.clone()).collect())
            .unwrap_or_default())
    }
}
