use std::time::Duration;

use icn_identity::{Device, Identity, KeyPair, Kid};
use icn_types::ChainReceipt;

use crate::error::DelegationError;
use crate::statement::LinkKind;

/// Everything needed to authorize `new_key` for `identity`.
#[derive(Debug, Clone, Copy)]
pub struct DelegationRequest<'a> {
    pub new_key: &'a KeyPair,
    /// Already-authorized key that countersigns; `None` for an eldest key.
    pub existing_key: Option<&'a KeyPair>,
    pub device: Option<&'a Device>,
    pub expire_in: Duration,
    pub sibkey: bool,
    /// Snapshot whose chain tail the new link extends.
    pub identity: &'a Identity,
    pub eldest_kid: Option<&'a Kid>,
    /// Pre-computed reverse signature; generated by the publisher when absent.
    pub reverse_sig: Option<&'a str>,
}

impl DelegationRequest<'_> {
    pub fn kind(&self) -> Result<LinkKind, DelegationError> {
        match (self.existing_key, self.sibkey) {
            (None, false) => Ok(LinkKind::Eldest),
            (None, true) => Err(DelegationError::MissingSigner),
            (Some(_), true) => Ok(LinkKind::Sibkey),
            (Some(_), false) => Ok(LinkKind::Subkey),
        }
    }
}

/// Signs and publishes delegations, returning where they landed.
#[async_trait::async_trait]
pub trait DelegationPublisher: Send + Sync {
    async fn run(&self, req: DelegationRequest<'_>) -> Result<ChainReceipt, DelegationError>;
}
