use crate::error::ChainError;
use cid::multihash::Multihash;
use cid::Cid;
use icn_identity::Kid;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

const DAG_CBOR: u64 = 0x71;
const SHA2_256: u64 = 0x12;

/// One signed statement in an identity's append-only chain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChainLink {
    pub seqno: u64,
    #[serde(
        serialize_with = "serialize_cid_option",
        deserialize_with = "deserialize_cid_option"
    )]
    pub prev: Option<Cid>,
    /// Canonical JSON of the signed statement.
    pub payload: String,
    /// Detached signature over `payload`.
    pub sig: String,
    pub signing_kid: Kid,
}

// Custom serializer for Option<Cid>
fn serialize_cid_option<S>(cid_opt: &Option<Cid>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match cid_opt {
        Some(cid) => serializer.serialize_some(&cid.to_string()),
        None => serializer.serialize_none(),
    }
}

// Custom deserializer for Option<Cid>
fn deserialize_cid_option<'de, D>(deserializer: D) -> Result<Option<Cid>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    match opt {
        Some(s) => {
            let cid = Cid::try_from(s)
                .map_err(|e| serde::de::Error::custom(format!("Invalid CID: {}", e)))?;
            Ok(Some(cid))
        }
        None => Ok(None),
    }
}

impl ChainLink {
    /// Content identifier of this link (CIDv1, dag-cbor, sha2-256).
    pub fn cid(&self) -> Result<Cid, ChainError> {
        let encoded = serde_cbor::to_vec(&self)?;
        let digest = Sha256::digest(&encoded);
        let hash = Multihash::<64>::wrap(SHA2_256, &digest)
            .map_err(|e| ChainError::Cid(e.to_string()))?;
        Ok(Cid::new_v1(DAG_CBOR, hash))
    }

    /// The previous link id as stored in a `ChainTail`.
    pub fn prev_id(&self) -> Option<String> {
        self.prev.as_ref().map(Cid::to_string)
    }

    /// Identifier of the signature itself, hex SHA-256 of the detached signature.
    pub fn sig_id(&self) -> String {
        hex::encode(Sha256::digest(self.sig.as_bytes()))
    }
}
