use icn_identity::ChainTail;
use thiserror::Error;

/// Signature chain errors
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("CBOR serialization error: {0}")]
    Cbor(#[from] serde_cbor::Error),

    #[error("Failed to build content identifier: {0}")]
    Cid(String),

    #[error("Chain for {name} moved: link {seqno} expected previous link {prev:?}, current tail is {tail:?}")]
    Conflict {
        name: String,
        seqno: u64,
        prev: Option<String>,
        tail: Option<ChainTail>,
    },

    #[error("Chain storage backend error: {0}")]
    Backend(String),
}
