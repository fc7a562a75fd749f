use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Position of the most recent link in an identity's signature chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainTail {
    /// Sequence number of the last link; the first link is 1.
    pub seqno: u64,
    /// Content identifier of the last link.
    pub link_id: String,
}

/// Snapshot of a user identity as seen at a particular chain head.
///
/// A snapshot is never edited in place. When the chain advances a new snapshot
/// is produced with [`Identity::with_tail`] and handed to whoever needs it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub uid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_tail: Option<ChainTail>,
}

impl Identity {
    /// A fresh identity with an empty chain.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uid: Uuid::new_v4().simple().to_string(),
            chain_tail: None,
        }
    }

    /// The same identity observed at a different chain head.
    pub fn with_tail(&self, tail: Option<ChainTail>) -> Self {
        Self {
            chain_tail: tail,
            ..self.clone()
        }
    }

    /// Sequence number the next appended link must carry.
    pub fn next_seqno(&self) -> u64 {
        self.chain_tail.as_ref().map_or(1, |t| t.seqno + 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Desktop,
    Mobile,
    Paper,
    Backup,
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DeviceKind::Desktop => "desktop",
            DeviceKind::Mobile => "mobile",
            DeviceKind::Paper => "paper",
            DeviceKind::Backup => "backup",
        };
        f.write_str(s)
    }
}

/// A device a key is provisioned for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: String,
    pub name: String,
    pub kind: DeviceKind,
}

impl Device {
    pub fn new(name: impl Into<String>, kind: DeviceKind) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            kind,
        }
    }
}
