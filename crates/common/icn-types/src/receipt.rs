use icn_identity::ChainTail;
use serde::{Deserialize, Serialize};

/// Where a published statement landed in an identity's chain.
///
/// Only a successful publication produces one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainReceipt {
    pub seqno: u64,
    /// CID of the appended link.
    pub link_id: String,
    /// Hex SHA-256 of the link's signature.
    pub sig_id: String,
}

impl ChainReceipt {
    /// The chain tail this receipt establishes.
    pub fn tail(&self) -> ChainTail {
        ChainTail {
            seqno: self.seqno,
            link_id: self.link_id.clone(),
        }
    }
}
