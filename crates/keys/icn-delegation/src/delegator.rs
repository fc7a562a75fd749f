use std::sync::Arc;

use chrono::Utc;
use cid::Cid;
use icn_types::{ChainLink, ChainReceipt, ChainStore};

use crate::error::DelegationError;
use crate::request::{DelegationPublisher, DelegationRequest};
use crate::sig::sign_statement;
use crate::statement::{reverse_sign, DelegationStatement, LinkKind};

/// Publishes delegations by appending signed links to a [`ChainStore`].
///
/// The link extends the tail recorded in the request's identity snapshot. If the
/// chain has moved since that snapshot was taken the store refuses the append
/// and the caller sees `DelegationError::Chain(ChainError::Conflict { .. })`.
#[derive(Clone)]
pub struct ChainDelegator {
    chain: Arc<dyn ChainStore>,
}

impl ChainDelegator {
    pub fn new(chain: Arc<dyn ChainStore>) -> Self {
        Self { chain }
    }

    /// Build and sign the link for `req` without publishing it.
    pub fn build_link(req: &DelegationRequest<'_>, ctime: i64) -> Result<ChainLink, DelegationError> {
        let kind = req.kind()?;
        let new_kid = &req.new_key.kid;

        let (signer, eldest_kid) = match kind {
            LinkKind::Eldest => {
                if let Some(eldest) = req.eldest_kid {
                    if eldest != new_kid {
                        return Err(DelegationError::EldestKidMismatch {
                            expected: new_kid.clone(),
                            found: eldest.clone(),
                        });
                    }
                }
                (req.new_key, new_kid.clone())
            }
            LinkKind::Sibkey | LinkKind::Subkey => {
                let signer = req.existing_key.ok_or(DelegationError::MissingSigner)?;
                let eldest = req.eldest_kid.ok_or(DelegationError::MissingEldestKid)?;
                (signer, eldest.clone())
            }
        };

        let tail = req.identity.chain_tail.as_ref();
        let mut statement = DelegationStatement {
            identity: req.identity.into(),
            seqno: req.identity.next_seqno(),
            prev: tail.map(|t| t.link_id.clone()),
            ctime,
            expire_in: req.expire_in.as_secs(),
            kind,
            eldest_kid,
            signing_kid: signer.kid.clone(),
            delegated_kid: new_kid.clone(),
            device: req.device.cloned(),
            reverse_sig: None,
        };

        if kind != LinkKind::Eldest {
            let claim = statement.reverse_claim();
            let reverse_sig = match req.reverse_sig {
                Some(sig) => {
                    claim.verify(sig)?;
                    sig.to_string()
                }
                None => reverse_sign(req.new_key, &claim)?,
            };
            statement.reverse_sig = Some(reverse_sig);
        }

        let prev = tail
            .map(|t| Cid::try_from(t.link_id.as_str()))
            .transpose()
            .map_err(|e| DelegationError::InvalidPrev(e.to_string()))?;

        let payload = String::from_utf8(statement.to_bytes()?)
            .map_err(|e| DelegationError::InvalidStatement(e.to_string()))?;
        let sig = sign_statement(payload.as_bytes(), signer)?;

        Ok(ChainLink {
            seqno: statement.seqno,
            prev,
            payload,
            sig,
            signing_kid: signer.kid.clone(),
        })
    }
}

#[async_trait::async_trait]
impl DelegationPublisher for ChainDelegator {
    async fn run(&self, req: DelegationRequest<'_>) -> Result<ChainReceipt, DelegationError> {
        let link = Self::build_link(&req, Utc::now().timestamp())?;
        let sig_id = link.sig_id();

        tracing::debug!(
            name = %req.identity.name,
            seqno = link.seqno,
            kid = %req.new_key.kid,
            signer = %link.signing_kid,
            "Publishing delegation"
        );
        let tail = self.chain.append(&req.identity.name, link).await?;

        Ok(ChainReceipt {
            seqno: tail.seqno,
            link_id: tail.link_id,
            sig_id,
        })
    }
}
