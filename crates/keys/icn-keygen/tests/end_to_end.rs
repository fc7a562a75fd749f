//! Key issuance against the real keyring, delegator and chain store.

use std::sync::Arc;

use assert_matches::assert_matches;
use icn_delegation::{verify_link, ChainDelegator, DelegationError, LinkKind};
use icn_identity::{Device, DeviceKind, Identity};
use icn_keygen::{Ed25519Generator, KeyGen, KeyGenArg, KeyGenError, KeyGenState};
use icn_keyring::{LocalKeySecurity, MemoryKeyring, SkbStore};
use icn_types::{ChainError, ChainStore, NullNotifier, SharedChainStore};

struct Node {
    keyring: Arc<MemoryKeyring>,
    chain: Arc<SharedChainStore>,
    delegator: Arc<ChainDelegator>,
}

impl Node {
    fn new() -> Self {
        let chain = Arc::new(SharedChainStore::new());
        Self {
            keyring: Arc::new(MemoryKeyring::new()),
            delegator: Arc::new(ChainDelegator::new(chain.clone())),
            chain,
        }
    }

    fn keygen(&self, arg: KeyGenArg) -> KeyGen {
        KeyGen::new(arg, self.keyring.clone(), self.delegator.clone())
    }

    async fn snapshot(&self, identity: &Identity) -> Arc<Identity> {
        let tail = self.chain.tail(&identity.name).await.unwrap();
        Arc::new(identity.with_tail(tail))
    }
}

fn plain_arg(identity: Arc<Identity>) -> KeyGenArg {
    KeyGenArg::new(Arc::new(Ed25519Generator), identity, Arc::new(NullNotifier))
}

#[tokio::test]
async fn eldest_then_lks_sibkey() {
    let node = Node::new();
    let alice = Identity::new("alice");

    let mut eldest_gen = node.keygen(plain_arg(node.snapshot(&alice).await));
    let first = eldest_gen.run().await.unwrap();
    assert_eq!(first.seqno, 1);
    let eldest = Arc::new(eldest_gen.key_pair().unwrap().clone());

    // The plain bundle unlocks without a security context.
    let stored = node.keyring.get("alice", &eldest.kid).await.unwrap().unwrap();
    assert_eq!(stored.unlock(None).unwrap(), *eldest);

    let lks = LocalKeySecurity::new([9u8; 32], 1);
    let arg = plain_arg(node.snapshot(&alice).await)
        .with_signer(eldest.clone())
        .with_eldest_kid(eldest.kid.clone())
        .with_sibkey(true)
        .with_device(Arc::new(Device::new("phone", DeviceKind::Mobile)));
    let mut sibkey_gen = node.keygen(arg);
    let second = sibkey_gen.run_lks(&lks).await.unwrap();
    assert_eq!(second.seqno, 2);

    let sibkey = sibkey_gen.key_pair().unwrap();
    let sealed = node.keyring.get("alice", &sibkey.kid).await.unwrap().unwrap();
    assert!(sealed.is_lks_protected());
    assert_eq!(sealed.unlock(Some(&lks)).unwrap(), *sibkey);

    let links = node.chain.links("alice").await.unwrap();
    assert_eq!(verify_link(&links[0]).unwrap().kind, LinkKind::Eldest);
    let statement = verify_link(&links[1]).unwrap();
    assert_eq!(statement.kind, LinkKind::Sibkey);
    assert_eq!(statement.delegated_kid, sibkey.kid);
    assert_eq!(statement.signing_kid, eldest.kid);
    assert_eq!(links[1].sig_id(), second.sig_id);
}

#[tokio::test]
async fn concurrent_advance_is_resolved_with_update_arg() {
    let node = Node::new();
    let alice = Identity::new("alice");

    let mut eldest_gen = node.keygen(plain_arg(node.snapshot(&alice).await));
    eldest_gen.run().await.unwrap();
    let eldest = Arc::new(eldest_gen.key_pair().unwrap().clone());

    // Two issuances prepared against the same chain head.
    let head = node.snapshot(&alice).await;
    let sibkey_arg = || {
        plain_arg(head.clone())
            .with_signer(eldest.clone())
            .with_eldest_kid(eldest.kid.clone())
            .with_sibkey(true)
    };
    let mut laptop = node.keygen(sibkey_arg());
    let mut phone = node.keygen(sibkey_arg());

    laptop.run().await.unwrap();

    phone.generate().unwrap();
    phone.save().await.unwrap();
    let err = phone.push().await.unwrap_err();
    assert_matches!(
        err,
        KeyGenError::Delegation(DelegationError::Chain(ChainError::Conflict { seqno: 2, .. }))
    );
    assert_eq!(phone.state(), KeyGenState::Persisted);

    // The unpublished key is still in the keyring.
    let phone_kid = phone.key_pair().unwrap().kid.clone();
    assert!(node.keyring.get("alice", &phone_kid).await.unwrap().is_some());

    // Re-target against the new head, keeping the key.
    let current = node.snapshot(&alice).await;
    phone.update_arg(Some(eldest.clone()), Some(eldest.kid.clone()), true, Some(current));
    let receipt = phone.push().await.unwrap();
    assert_eq!(receipt.seqno, 3);

    let links = node.chain.links("alice").await.unwrap();
    assert_eq!(links.len(), 3);
    assert_eq!(verify_link(&links[2]).unwrap().delegated_kid, phone_kid);
    assert_eq!(node.keyring.list("alice").await.unwrap().len(), 3);
}
