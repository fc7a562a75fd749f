use std::fmt;
use std::sync::Arc;

use icn_delegation::{DelegationPublisher, DelegationRequest};
use icn_identity::{Identity, KeyPair, Kid};
use icn_keyring::{KeyringPersistence, LksKeyring, LocalKeySecurity, PlainKeyring, SkbStore, StoredKey};
use icn_types::ChainReceipt;

use crate::arg::KeyGenArg;
use crate::error::KeyGenError;

/// Where a [`KeyGen`] is in its lifecycle. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyGenState {
    Created,
    Generated,
    Persisted,
    Published,
}

impl fmt::Display for KeyGenState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            KeyGenState::Created => "created",
            KeyGenState::Generated => "generated",
            KeyGenState::Persisted => "persisted",
            KeyGenState::Published => "published",
        };
        f.write_str(s)
    }
}

/// Single-use workflow that issues one key for one identity.
///
/// Stages run in order: [`generate`](Self::generate), then
/// [`save`](Self::save) or [`save_lks`](Self::save_lks), then
/// [`push`](Self::push). A stage called out of order fails with
/// [`KeyGenError::InvalidState`] and touches no collaborator. A failing stage
/// leaves the state where it was, so it can be retried.
///
/// Pushes for the same identity must be serialized by the caller: a
/// delegation is only valid against the chain head it was built from.
pub struct KeyGen {
    arg: KeyGenArg,
    keyring: Arc<dyn SkbStore>,
    publisher: Arc<dyn DelegationPublisher>,
    pair: Option<KeyPair>,
    receipt: Option<ChainReceipt>,
    state: KeyGenState,
}

impl KeyGen {
    pub fn new(
        arg: KeyGenArg,
        keyring: Arc<dyn SkbStore>,
        publisher: Arc<dyn DelegationPublisher>,
    ) -> Self {
        Self {
            arg,
            keyring,
            publisher,
            pair: None,
            receipt: None,
            state: KeyGenState::Created,
        }
    }

    pub fn state(&self) -> KeyGenState {
        self.state
    }

    pub fn arg(&self) -> &KeyGenArg {
        &self.arg
    }

    /// The generated keypair, `None` until [`generate`](Self::generate) succeeds.
    pub fn key_pair(&self) -> Option<&KeyPair> {
        self.pair.as_ref()
    }

    /// Receipt of the successful push, if there was one.
    pub fn receipt(&self) -> Option<&ChainReceipt> {
        self.receipt.as_ref()
    }

    /// Invoke the generator once and keep the keypair.
    pub fn generate(&mut self) -> Result<&KeyPair, KeyGenError> {
        if self.state != KeyGenState::Created {
            return Err(self.invalid("generate"));
        }
        let pair = self.arg.generator.generate()?;
        tracing::debug!(name = %self.arg.identity.name, kid = %pair.kid, "Generated keypair");
        self.state = KeyGenState::Generated;
        Ok(self.pair.insert(pair))
    }

    /// Persist the keypair under the plain keyring policy.
    pub async fn save(&mut self) -> Result<StoredKey, KeyGenError> {
        let store = Arc::clone(&self.keyring);
        let policy = PlainKeyring::new(store.as_ref());
        self.persist_with("save", &policy).await
    }

    /// Persist the keypair sealed under local key security.
    pub async fn save_lks(&mut self, lks: &LocalKeySecurity) -> Result<StoredKey, KeyGenError> {
        let store = Arc::clone(&self.keyring);
        let policy = LksKeyring::new(store.as_ref(), lks);
        self.persist_with("save_lks", &policy).await
    }

    async fn persist_with(
        &mut self,
        op: &'static str,
        policy: &dyn KeyringPersistence,
    ) -> Result<StoredKey, KeyGenError> {
        let pair = match (&self.pair, self.state) {
            (Some(pair), KeyGenState::Generated | KeyGenState::Persisted) => pair,
            _ => return Err(self.invalid(op)),
        };

        let stored = policy
            .persist(&self.arg.identity.name, pair, self.arg.notifier.as_ref())
            .await?;
        tracing::debug!(name = %stored.name, kid = %stored.kid, op, "Persisted keypair");
        self.state = KeyGenState::Persisted;
        Ok(stored)
    }

    /// Publish the delegation for the persisted key, built from the argument as
    /// it stands now.
    pub async fn push(&mut self) -> Result<ChainReceipt, KeyGenError> {
        let pair = match (&self.pair, self.state) {
            (Some(pair), KeyGenState::Persisted) => pair,
            _ => return Err(self.invalid("push")),
        };

        let arg = &self.arg;
        let req = DelegationRequest {
            new_key: pair,
            existing_key: arg.signer.as_deref(),
            device: arg.device.as_deref(),
            expire_in: arg.expire_in,
            sibkey: arg.is_sibkey,
            identity: arg.identity.as_ref(),
            eldest_kid: arg.eldest_kid.as_ref(),
            reverse_sig: arg.reverse_sig.as_deref(),
        };

        match self.publisher.run(req).await {
            Ok(receipt) => {
                tracing::debug!(
                    name = %arg.identity.name,
                    seqno = receipt.seqno,
                    link_id = %receipt.link_id,
                    "Published key delegation"
                );
                self.state = KeyGenState::Published;
                self.receipt = Some(receipt.clone());
                Ok(receipt)
            }
            Err(e) => {
                arg.notifier.report(&format!("push error: {}", e));
                tracing::warn!(name = %arg.identity.name, kid = %pair.kid, error = %e, "Key delegation push failed");
                Err(e.into())
            }
        }
    }

    /// Generate, save under local key security, push. Stops at the first error
    /// and leaves whatever the completed stages produced.
    pub async fn run_lks(&mut self, lks: &LocalKeySecurity) -> Result<ChainReceipt, KeyGenError> {
        self.generate()?;
        self.save_lks(lks).await?;
        self.push().await
    }

    /// Generate, save under the plain policy, push.
    pub async fn run(&mut self) -> Result<ChainReceipt, KeyGenError> {
        self.generate()?;
        self.save().await?;
        self.push().await
    }

    /// Re-target the pending delegation after the identity's chain moved.
    ///
    /// `signer`, `eldest_kid` and `is_sibkey` are always overwritten; the
    /// identity snapshot only when one is supplied. The generated and persisted
    /// key is kept.
    pub fn update_arg(
        &mut self,
        signer: Option<Arc<KeyPair>>,
        eldest_kid: Option<Kid>,
        is_sibkey: bool,
        identity: Option<Arc<Identity>>,
    ) {
        self.arg.signer = signer;
        self.arg.eldest_kid = eldest_kid;
        self.arg.is_sibkey = is_sibkey;
        if let Some(identity) = identity {
            self.arg.identity = identity;
        }
        tracing::debug!(
            name = %self.arg.identity.name,
            tail = ?self.arg.identity.chain_tail,
            is_sibkey,
            "Updated key generation argument"
        );
    }

    fn invalid(&self, op: &'static str) -> KeyGenError {
        KeyGenError::InvalidState {
            op,
            state: self.state,
        }
    }
}
