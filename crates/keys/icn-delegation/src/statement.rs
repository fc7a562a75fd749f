use icn_identity::{Device, Identity, KeyPair, Kid};
use icn_types::ChainLink;
use serde::{Deserialize, Serialize};

use crate::error::DelegationError;
use crate::sig::{sign_statement, verify_statement};

/// What a delegation link does to the identity's key set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    /// Founding key of a new epoch, self-signed.
    Eldest,
    /// Peer signing key, signed by an existing key.
    Sibkey,
    /// Subordinate key, signed by an existing key.
    Subkey,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementIdentity {
    pub name: String,
    pub uid: String,
}

impl From<&Identity> for StatementIdentity {
    fn from(identity: &Identity) -> Self {
        Self {
            name: identity.name.clone(),
            uid: identity.uid.clone(),
        }
    }
}

/// Body of a delegation link, serialized as the link payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegationStatement {
    pub identity: StatementIdentity,
    pub seqno: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<String>,
    /// Unix seconds.
    pub ctime: i64,
    /// Validity in seconds from `ctime`.
    pub expire_in: u64,
    pub kind: LinkKind,
    pub eldest_kid: Kid,
    pub signing_kid: Kid,
    pub delegated_kid: Kid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<Device>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reverse_sig: Option<String>,
}

impl DelegationStatement {
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn reverse_claim(&self) -> ReverseClaim {
        ReverseClaim {
            uid: self.identity.uid.clone(),
            eldest_kid: self.eldest_kid.clone(),
            signing_kid: self.signing_kid.clone(),
            delegated_kid: self.delegated_kid.clone(),
        }
    }
}

/// What the delegated key countersigns: "I accept delegation from `signing_kid`
/// into `uid`'s epoch rooted at `eldest_kid`". Independent of chain position,
/// so it can be computed before the link is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReverseClaim {
    pub uid: String,
    pub eldest_kid: Kid,
    pub signing_kid: Kid,
    pub delegated_kid: Kid,
}

impl ReverseClaim {
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn verify(&self, reverse_sig: &str) -> Result<(), DelegationError> {
        verify_statement(&self.to_bytes()?, reverse_sig, &self.delegated_kid)
            .map_err(|_| DelegationError::InvalidReverseSig)
    }
}

/// Produce the reverse signature for `claim` with the delegated key.
pub fn reverse_sign(new_key: &KeyPair, claim: &ReverseClaim) -> Result<String, DelegationError> {
    if new_key.kid != claim.delegated_kid {
        return Err(DelegationError::InvalidStatement(format!(
            "reverse signer {} is not the delegated key {}",
            new_key.kid, claim.delegated_kid
        )));
    }
    Ok(sign_statement(&claim.to_bytes()?, new_key)?)
}

/// Check the signatures a delegation link carries and return its statement.
///
/// This checks one link in isolation; it says nothing about whether the
/// signing key was itself authorized at that point of the chain.
pub fn verify_link(link: &ChainLink) -> Result<DelegationStatement, DelegationError> {
    let statement: DelegationStatement = serde_json::from_str(&link.payload)?;

    if statement.seqno != link.seqno || statement.prev != link.prev_id() {
        return Err(DelegationError::InvalidStatement(
            "chain position differs from link".into(),
        ));
    }
    if statement.signing_kid != link.signing_kid {
        return Err(DelegationError::InvalidStatement(
            "signing key differs from link".into(),
        ));
    }
    verify_statement(link.payload.as_bytes(), &link.sig, &link.signing_kid)?;

    match statement.kind {
        LinkKind::Eldest => {
            if statement.delegated_kid != statement.signing_kid
                || statement.eldest_kid != statement.delegated_kid
            {
                return Err(DelegationError::InvalidStatement(
                    "eldest link must be self-signed".into(),
                ));
            }
        }
        LinkKind::Sibkey | LinkKind::Subkey => {
            let reverse_sig = statement
                .reverse_sig
                .as_deref()
                .ok_or(DelegationError::MissingReverseSig)?;
            statement.reverse_claim().verify(reverse_sig)?;
        }
    }
    Ok(statement)
}
