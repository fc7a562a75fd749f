use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use icn_delegation::{
    reverse_sign, verify_link, ChainDelegator, DelegationError, DelegationPublisher,
    DelegationRequest, LinkKind,
};
use icn_identity::{Device, DeviceKind, Identity, KeyPair};
use icn_types::{ChainError, ChainStore, SharedChainStore};

const YEAR: Duration = Duration::from_secs(365 * 24 * 60 * 60);

fn key(seed: u8) -> KeyPair {
    KeyPair::from_secret_bytes(&[seed; 32])
}

fn eldest_request<'a>(new_key: &'a KeyPair, identity: &'a Identity) -> DelegationRequest<'a> {
    DelegationRequest {
        new_key,
        existing_key: None,
        device: None,
        expire_in: YEAR,
        sibkey: false,
        identity,
        eldest_kid: None,
        reverse_sig: None,
    }
}

fn sibkey_request<'a>(
    new_key: &'a KeyPair,
    signer: &'a KeyPair,
    identity: &'a Identity,
) -> DelegationRequest<'a> {
    DelegationRequest {
        new_key,
        existing_key: Some(signer),
        device: None,
        expire_in: YEAR,
        sibkey: true,
        identity,
        eldest_kid: Some(&signer.kid),
        reverse_sig: None,
    }
}

#[tokio::test]
async fn eldest_then_sibkey() {
    let chain = Arc::new(SharedChainStore::new());
    let delegator = ChainDelegator::new(chain.clone());
    let alice = Identity::new("alice");
    let eldest = key(1);

    let receipt = delegator.run(eldest_request(&eldest, &alice)).await.unwrap();
    assert_eq!(receipt.seqno, 1);

    let alice = alice.with_tail(Some(receipt.tail()));
    let laptop = Device::new("laptop", DeviceKind::Desktop);
    let sibkey = key(2);
    let receipt = delegator
        .run(DelegationRequest {
            new_key: &sibkey,
            existing_key: Some(&eldest),
            device: Some(&laptop),
            expire_in: YEAR,
            sibkey: true,
            identity: &alice,
            eldest_kid: Some(&eldest.kid),
            reverse_sig: None,
        })
        .await
        .unwrap();
    assert_eq!(receipt.seqno, 2);
    assert_eq!(chain.tail("alice").await.unwrap(), Some(receipt.tail()));

    let links = chain.links("alice").await.unwrap();
    let first = verify_link(&links[0]).unwrap();
    assert_eq!(first.kind, LinkKind::Eldest);
    assert_eq!(first.delegated_kid, eldest.kid);
    assert!(first.reverse_sig.is_none());

    let second = verify_link(&links[1]).unwrap();
    assert_eq!(second.kind, LinkKind::Sibkey);
    assert_eq!(second.signing_kid, eldest.kid);
    assert_eq!(second.delegated_kid, sibkey.kid);
    assert_eq!(second.eldest_kid, eldest.kid);
    assert_eq!(second.device, Some(laptop));
    assert_eq!(second.expire_in, YEAR.as_secs());
    assert_eq!(links[1].sig_id(), receipt.sig_id);
}

#[test]
fn subkey_uses_supplied_reverse_signature() {
    let alice = Identity::new("alice");
    let eldest = key(1);
    let subkey = key(3);

    // Build once to learn the claim, then hand the reverse signature back in.
    let req = DelegationRequest {
        new_key: &subkey,
        existing_key: Some(&eldest),
        device: None,
        expire_in: YEAR,
        sibkey: false,
        identity: &alice,
        eldest_kid: Some(&eldest.kid),
        reverse_sig: None,
    };
    let link = ChainDelegator::build_link(&req, 1_700_000_000).unwrap();
    let statement = verify_link(&link).unwrap();
    assert_eq!(statement.kind, LinkKind::Subkey);

    let precomputed = reverse_sign(&subkey, &statement.reverse_claim()).unwrap();
    let link = ChainDelegator::build_link(
        &DelegationRequest {
            reverse_sig: Some(&precomputed),
            ..req
        },
        1_700_000_001,
    )
    .unwrap();
    let statement = verify_link(&link).unwrap();
    assert_eq!(statement.reverse_sig.as_deref(), Some(precomputed.as_str()));

    let forged = reverse_sign(&eldest, &statement.reverse_claim());
    assert!(forged.is_err());
    let bogus = ChainDelegator::build_link(
        &DelegationRequest {
            reverse_sig: Some("e30..AAAA"),
            ..req
        },
        1_700_000_002,
    );
    assert_matches!(bogus, Err(DelegationError::InvalidReverseSig));
}

#[test]
fn argument_errors() {
    let alice = Identity::new("alice");
    let eldest = key(1);
    let other = key(9);

    let no_signer = DelegationRequest {
        sibkey: true,
        ..eldest_request(&other, &alice)
    };
    assert_matches!(ChainDelegator::build_link(&no_signer, 0), Err(DelegationError::MissingSigner));

    let no_eldest = DelegationRequest {
        existing_key: Some(&eldest),
        sibkey: true,
        ..eldest_request(&other, &alice)
    };
    assert_matches!(ChainDelegator::build_link(&no_eldest, 0), Err(DelegationError::MissingEldestKid));

    let wrong_eldest = DelegationRequest {
        eldest_kid: Some(&eldest.kid),
        ..eldest_request(&other, &alice)
    };
    assert_matches!(
        ChainDelegator::build_link(&wrong_eldest, 0),
        Err(DelegationError::EldestKidMismatch { .. })
    );
}

#[tokio::test]
async fn stale_snapshot_conflicts() {
    let chain = Arc::new(SharedChainStore::new());
    let delegator = ChainDelegator::new(chain.clone());
    let alice = Identity::new("alice");
    let eldest = key(1);

    let receipt = delegator.run(eldest_request(&eldest, &alice)).await.unwrap();
    let current = alice.with_tail(Some(receipt.tail()));

    let first = key(2);
    delegator.run(sibkey_request(&first, &eldest, &current)).await.unwrap();

    // Still holding the pre-advance snapshot.
    let second = key(3);
    let err = delegator.run(sibkey_request(&second, &eldest, &current)).await.unwrap_err();
    assert_matches!(err, DelegationError::Chain(ChainError::Conflict { seqno: 2, .. }));
    assert_eq!(chain.links("alice").await.unwrap().len(), 2);
}
