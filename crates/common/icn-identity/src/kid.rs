use multibase::{decode, Base};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// Ed25519 public key multicodec prefix
const ED25519_MULTICODEC_PREFIX: u8 = 0xed;

// Codec byte plus 32 key bytes
const KID_LEN: usize = 33;

/// Error type for key identifier parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KidError {
    #[error("malformed key id")]
    Malformed,
    #[error("unsupported multicodec: {0:#x}")]
    UnsupportedCodec(u64),
    #[error("key id does not encode a valid Ed25519 point")]
    InvalidKey,
}

/// Identifier of a public key as it appears in chain statements and the keyring.
///
/// Encoded as `z<base58btc(0xED || pk)>`, the same payload a `did:key` carries.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Kid(String);

impl Kid {
    /// Build the key id for an Ed25519 verifying key.
    pub fn from_verifying_key(pk: &ed25519_dalek::VerifyingKey) -> Self {
        let mut bytes = Vec::with_capacity(KID_LEN);
        bytes.push(ED25519_MULTICODEC_PREFIX);
        bytes.extend_from_slice(pk.as_bytes());
        Self(multibase::encode(Base::Base58Btc, bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode the embedded Ed25519 public key.
    pub fn to_verifying_key(&self) -> Result<ed25519_dalek::VerifyingKey, KidError> {
        let (_, data) = decode(&self.0).map_err(|_| KidError::Malformed)?;
        if data.len() != KID_LEN {
            return Err(KidError::Malformed);
        }

        let (codec, key_bytes) = data.split_first().ok_or(KidError::Malformed)?;
        if *codec != ED25519_MULTICODEC_PREFIX {
            return Err(KidError::UnsupportedCodec(*codec as u64));
        }
        let bytes: [u8; 32] = key_bytes.try_into().map_err(|_| KidError::Malformed)?;
        ed25519_dalek::VerifyingKey::from_bytes(&bytes).map_err(|_| KidError::InvalidKey)
    }
}

impl FromStr for Kid {
    type Err = KidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kid = Kid(s.to_string());
        kid.to_verifying_key()?;
        Ok(kid)
    }
}

impl TryFrom<String> for Kid {
    type Error = KidError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Kid> for String {
    fn from(kid: Kid) -> Self {
        kid.0
    }
}

impl fmt::Display for Kid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
