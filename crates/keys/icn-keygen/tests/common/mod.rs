#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use icn_delegation::{DelegationError, DelegationPublisher, DelegationRequest};
use icn_identity::{ChainTail, KeyPair, Kid};
use icn_keygen::{GenerateError, KeyGenerator};
use icn_keyring::{KeyringError, SkbPacket, SkbStore, StoredKey};
use icn_types::{ChainReceipt, Notifier};

pub fn key(seed: u8) -> KeyPair {
    KeyPair::from_secret_bytes(&[seed; 32])
}

/// Generator that always returns the same keypair and counts its calls.
pub fn fixed_generator(pair: KeyPair) -> (Arc<dyn KeyGenerator>, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let generator = move || -> Result<KeyPair, GenerateError> {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(pair.clone())
    };
    (Arc::new(generator), calls)
}

pub fn failing_generator() -> (Arc<dyn KeyGenerator>, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let generator = move || -> Result<KeyPair, GenerateError> {
        counter.fetch_add(1, Ordering::SeqCst);
        Err(GenerateError::Entropy("rng unavailable".into()))
    };
    (Arc::new(generator), calls)
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub messages: Mutex<Vec<String>>,
}

impl Notifier for RecordingNotifier {
    fn report(&self, msg: &str) {
        self.messages.lock().unwrap().push(msg.to_string());
    }
}

/// Keyring that records writes and removals and can be told to fail.
#[derive(Default)]
pub struct RecordingKeyring {
    pub puts: Mutex<Vec<(String, SkbPacket)>>,
    pub removes: AtomicUsize,
    pub failures_left: AtomicUsize,
}

impl RecordingKeyring {
    pub fn failing(times: usize) -> Self {
        Self {
            failures_left: AtomicUsize::new(times),
            ..Self::default()
        }
    }

    pub fn put_count(&self) -> usize {
        self.puts.lock().unwrap().len()
    }
}

#[async_trait]
impl SkbStore for RecordingKeyring {
    async fn put(&self, name: &str, packet: SkbPacket) -> Result<StoredKey, KeyringError> {
        let should_fail = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(KeyringError::Backend("disk full".into()));
        }

        let stored = StoredKey {
            name: name.to_string(),
            kid: packet.kid.clone(),
            locator: format!("stub:{}", packet.kid),
        };
        self.puts.lock().unwrap().push((name.to_string(), packet));
        Ok(stored)
    }

    async fn get(&self, name: &str, kid: &Kid) -> Result<Option<SkbPacket>, KeyringError> {
        Ok(self
            .puts
            .lock()
            .unwrap()
            .iter()
            .find(|(n, p)| n == name && &p.kid == kid)
            .map(|(_, p)| p.clone()))
    }

    async fn list(&self, name: &str) -> Result<Vec<SkbPacket>, KeyringError> {
        Ok(self
            .puts
            .lock()
            .unwrap()
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, p)| p.clone())
            .collect())
    }

    async fn remove(&self, _name: &str, _kid: &Kid) -> Result<(), KeyringError> {
        self.removes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// What a publisher was asked to delegate.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishCall {
    pub new_kid: Kid,
    pub existing_kid: Option<Kid>,
    pub device_id: Option<String>,
    pub expire_in: Duration,
    pub sibkey: bool,
    pub identity_name: String,
    pub identity_tail: Option<ChainTail>,
    pub eldest_kid: Option<Kid>,
    pub reverse_sig: Option<String>,
}

pub struct RecordingPublisher {
    pub calls: Mutex<Vec<PublishCall>>,
    pub reject_with: Mutex<Option<String>>,
    pub receipt: ChainReceipt,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            reject_with: Mutex::new(None),
            receipt: stub_receipt(),
        }
    }

    pub fn rejecting(reason: &str) -> Self {
        let publisher = Self::new();
        *publisher.reject_with.lock().unwrap() = Some(reason.to_string());
        publisher
    }

    pub fn accept(&self) {
        *self.reject_with.lock().unwrap() = None;
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

pub fn stub_receipt() -> ChainReceipt {
    ChainReceipt {
        seqno: 7,
        link_id: "bafy-stub-link".into(),
        sig_id: "00ff".into(),
    }
}

#[async_trait]
impl DelegationPublisher for RecordingPublisher {
    async fn run(&self, req: DelegationRequest<'_>) -> Result<ChainReceipt, DelegationError> {
        self.calls.lock().unwrap().push(PublishCall {
            new_kid: req.new_key.kid.clone(),
            existing_kid: req.existing_key.map(|k| k.kid.clone()),
            device_id: req.device.map(|d| d.id.clone()),
            expire_in: req.expire_in,
            sibkey: req.sibkey,
            identity_name: req.identity.name.clone(),
            identity_tail: req.identity.chain_tail.clone(),
            eldest_kid: req.eldest_kid.cloned(),
            reverse_sig: req.reverse_sig.map(str::to_string),
        });

        match self.reject_with.lock().unwrap().clone() {
            Some(reason) => Err(DelegationError::Rejected(reason)),
            None => Ok(self.receipt.clone()),
        }
    }
}
