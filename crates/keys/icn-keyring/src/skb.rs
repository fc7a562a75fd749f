use chrono::{DateTime, Utc};
use icn_identity::{KeyPair, Kid};
use serde::{Deserialize, Serialize};

use crate::error::KeyringError;
use crate::lks::LocalKeySecurity;

/// How the secret half of a bundle is held.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "protection", rename_all = "snake_case")]
pub enum SecretBlob {
    Plain {
        #[serde(with = "serde_bytes")]
        secret: Vec<u8>,
    },
    Lks {
        generation: u32,
        #[serde(with = "serde_bytes")]
        nonce: Vec<u8>,
        #[serde(with = "serde_bytes")]
        ciphertext: Vec<u8>,
    },
}

/// Secret key bundle: one keypair as written to the keyring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkbPacket {
    pub kid: Kid,
    #[serde(with = "serde_bytes")]
    pub public: Vec<u8>,
    pub secret: SecretBlob,
    pub ctime: DateTime<Utc>,
}

impl SkbPacket {
    /// Bundle holding the secret unprotected.
    pub fn plain(pair: &KeyPair) -> Self {
        Self {
            kid: pair.kid.clone(),
            public: pair.public_bytes().to_vec(),
            secret: SecretBlob::Plain {
                secret: pair.secret_bytes().to_vec(),
            },
            ctime: Utc::now(),
        }
    }

    /// Bundle holding the secret sealed under `lks`, bound to the key id.
    pub fn sealed(pair: &KeyPair, lks: &LocalKeySecurity) -> Result<Self, KeyringError> {
        let (nonce, ciphertext) = lks.encrypt(&pair.secret_bytes()[..], pair.kid.as_str().as_bytes())?;
        Ok(Self {
            kid: pair.kid.clone(),
            public: pair.public_bytes().to_vec(),
            secret: SecretBlob::Lks {
                generation: lks.generation(),
                nonce,
                ciphertext,
            },
            ctime: Utc::now(),
        })
    }

    pub fn is_lks_protected(&self) -> bool {
        matches!(self.secret, SecretBlob::Lks { .. })
    }

    pub fn encode(&self) -> Result<Vec<u8>, KeyringError> {
        serde_cbor::to_vec(self).map_err(KeyringError::Encode)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, KeyringError> {
        serde_cbor::from_slice(bytes).map_err(KeyringError::Decode)
    }

    /// Recover the keypair. LKS-protected bundles need the matching context.
    pub fn unlock(&self, lks: Option<&LocalKeySecurity>) -> Result<KeyPair, KeyringError> {
        let pair = match &self.secret {
            SecretBlob::Plain { secret } => {
                let seed: [u8; 32] = secret
                    .as_slice()
                    .try_into()
                    .map_err(|_| KeyringError::MalformedSecret)?;
                KeyPair::from_secret_bytes(&seed)
            }
            SecretBlob::Lks {
                generation,
                nonce,
                ciphertext,
            } => {
                let lks = lks.ok_or_else(|| KeyringError::LocalKeySecurityRequired(self.kid.clone()))?;
                if lks.generation() != *generation {
                    return Err(KeyringError::GenerationMismatch {
                        expected: lks.generation(),
                        found: *generation,
                    });
                }
                let plain = lks.decrypt(nonce, ciphertext, self.kid.as_str().as_bytes())?;
                let seed: [u8; 32] = plain
                    .as_slice()
                    .try_into()
                    .map_err(|_| KeyringError::MalformedSecret)?;
                KeyPair::from_secret_bytes(&seed)
            }
        };

        if pair.kid != self.kid {
            return Err(KeyringError::KeyMismatch {
                expected: self.kid.clone(),
                found: pair.kid,
            });
        }
        Ok(pair)
    }
}
