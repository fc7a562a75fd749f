use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use icn_delegation::{verify_link, ChainDelegator, DelegationError, DelegationStatement};
use icn_identity::{Device, Identity, KeyPair, Kid};
use icn_keygen::{Ed25519Generator, KeyGen, KeyGenArg, KeyGenError};
use icn_keyring::{LocalKeySecurity, SkbPacket, SkbStore};
use icn_types::{ChainError, ChainReceipt, ChainStore, Notifier};

use crate::config::KeyctlConfig;
use crate::sled_storage::SledStorage;

/// Generation recorded in bundles sealed with a passphrase-derived secret.
const LKS_GENERATION: u32 = 1;

/// A key that made it into the chain.
#[derive(Debug, Clone)]
pub struct Issued {
    pub kid: Kid,
    pub receipt: ChainReceipt,
}

/// Everything known locally about one identity.
#[derive(Debug)]
pub struct Listing {
    pub identity: Identity,
    pub keys: Vec<SkbPacket>,
    pub links: Vec<DelegationStatement>,
}

pub struct Keyctl {
    storage: Arc<SledStorage>,
    config: KeyctlConfig,
    notifier: Arc<dyn Notifier>,
}

impl Keyctl {
    pub fn new(storage: Arc<SledStorage>, config: KeyctlConfig, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            storage,
            config,
            notifier,
        }
    }

    pub fn storage(&self) -> &SledStorage {
        &self.storage
    }

    /// Derive `name`'s local key security context when a passphrase is given.
    pub fn lks(&self, name: &str, passphrase: Option<&str>) -> Result<Option<LocalKeySecurity>> {
        let Some(passphrase) = passphrase else {
            return Ok(None);
        };
        let salt = self.storage.lks_salt(name)?;
        let lks = LocalKeySecurity::from_passphrase(
            passphrase.as_bytes(),
            &salt,
            self.config.lks_params(),
            LKS_GENERATION,
        )
        .context("Failed to derive local key security from passphrase")?;
        Ok(Some(lks))
    }

    /// Generation argument with the configured expiry and no delegation metadata.
    pub fn base_arg(&self, identity: Identity) -> KeyGenArg {
        KeyGenArg::new(
            Arc::new(Ed25519Generator),
            Arc::new(identity),
            Arc::clone(&self.notifier),
        )
        .with_expire_in(self.config.expire_in())
    }

    pub fn keygen(&self, arg: KeyGenArg) -> KeyGen {
        let publisher = ChainDelegator::new(self.storage.clone());
        KeyGen::new(arg, self.storage.clone(), Arc::new(publisher))
    }

    /// Register `name` and publish its self-signed eldest key.
    ///
    /// An identity left registered with an empty chain by an earlier failed
    /// `init` is picked up again rather than refused.
    pub async fn init(&self, name: &str, passphrase: Option<&str>) -> Result<Issued> {
        let lks = self.lks(name, passphrase)?;
        let identity = match self.storage.load_identity(name).await? {
            Some(identity) if identity.chain_tail.is_none() => {
                tracing::info!(identity = name, uid = %identity.uid, "Resuming initialization of identity with an empty chain");
                identity
            }
            Some(_) => bail!("Identity {} already exists", name),
            None => self.storage.create_identity(name)?,
        };

        let mut keygen = self.keygen(self.base_arg(identity));
        let receipt = match &lks {
            Some(lks) => keygen.run_lks(lks).await?,
            None => keygen.run().await?,
        };
        self.storage.flush().await?;

        let kid = issued_kid(&keygen)?;
        tracing::info!(identity = name, kid = %kid, seqno = receipt.seqno, "Initialized identity");
        Ok(Issued { kid, receipt })
    }

    /// Issue a sibkey (or subkey) for `device`, signed by the current eldest key.
    pub async fn add_key(
        &self,
        name: &str,
        device: Device,
        sibkey: bool,
        passphrase: Option<&str>,
    ) -> Result<Issued> {
        let identity = self.identity(name).await?;
        let lks = self.lks(name, passphrase)?;
        let (signer, eldest_kid) = self.eldest(name, lks.as_ref()).await?;

        let arg = self
            .base_arg(identity)
            .with_signer(signer)
            .with_eldest_kid(eldest_kid)
            .with_sibkey(sibkey)
            .with_device(Arc::new(device));
        let mut keygen = self.keygen(arg);

        keygen.generate()?;
        match &lks {
            Some(lks) => keygen.save_lks(lks).await?,
            None => keygen.save().await?,
        };
        let receipt = self.publish(name, &mut keygen, lks.as_ref()).await?;
        self.storage.flush().await?;

        let kid = issued_kid(&keygen)?;
        tracing::info!(identity = name, kid = %kid, seqno = receipt.seqno, sibkey, "Added key");
        Ok(Issued { kid, receipt })
    }

    /// Push a persisted key. If the chain moved since the key's snapshot was
    /// taken, re-target it at the current tail and eldest key and push once more.
    pub async fn publish(
        &self,
        name: &str,
        keygen: &mut KeyGen,
        lks: Option<&LocalKeySecurity>,
    ) -> Result<ChainReceipt> {
        match keygen.push().await {
            Ok(receipt) => Ok(receipt),
            Err(KeyGenError::Delegation(DelegationError::Chain(ChainError::Conflict { tail, .. }))) => {
                tracing::info!(identity = name, tail = ?tail, "Chain moved during push, retrying against the new tail");
                let identity = self.identity(name).await?;
                let (signer, eldest_kid) = self.eldest(name, lks).await?;
                let sibkey = keygen.arg().is_sibkey;
                keygen.update_arg(Some(signer), Some(eldest_kid), sibkey, Some(Arc::new(identity)));
                Ok(keygen.push().await?)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn list(&self, name: &str) -> Result<Listing> {
        let identity = self.identity(name).await?;
        let keys = self.storage.list(name).await?;
        let links = self
            .storage
            .links(name)
            .await?
            .iter()
            .map(|link| {
                verify_link(link).with_context(|| format!("Chain link {} of {} is invalid", link.seqno, name))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Listing {
            identity,
            keys,
            links,
        })
    }

    async fn identity(&self, name: &str) -> Result<Identity> {
        self.storage
            .load_identity(name)
            .await?
            .ok_or_else(|| anyhow!("Unknown identity {}; run `init {}` first", name, name))
    }

    /// The eldest key of `name`'s current epoch, unlocked from the keyring.
    async fn eldest(&self, name: &str, lks: Option<&LocalKeySecurity>) -> Result<(Arc<KeyPair>, Kid)> {
        let links = self.storage.links(name).await?;
        let head = links
            .last()
            .ok_or_else(|| anyhow!("Identity {} has no keys yet", name))?;
        let eldest_kid = verify_link(head)
            .with_context(|| format!("Chain head of {} is invalid", name))?
            .eldest_kid;

        let packet = SkbStore::get(self.storage.as_ref(), name, &eldest_kid)
            .await?
            .ok_or_else(|| anyhow!("Eldest key {} is not in the local keyring", eldest_kid))?;
        let pair = packet
            .unlock(lks)
            .with_context(|| format!("Failed to unlock eldest key {}", eldest_kid))?;
        Ok((Arc::new(pair), eldest_kid))
    }
}

fn issued_kid(keygen: &KeyGen) -> Result<Kid> {
    keygen
        .key_pair()
        .map(|pair| pair.kid.clone())
        .context("Key generation finished without a keypair")
}
