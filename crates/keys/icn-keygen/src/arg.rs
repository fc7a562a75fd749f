use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use icn_identity::{Device, Identity, KeyPair, Kid};
use icn_types::Notifier;

use crate::generator::KeyGenerator;

/// One year.
pub const DEFAULT_EXPIRE_IN: Duration = Duration::from_secs(60 * 60 * 24 * 365);

/// The current issuance intent for one new key.
///
/// Once handed to a [`KeyGen`](crate::KeyGen) it is read at every stage, so a
/// change made through [`KeyGen::update_arg`](crate::KeyGen::update_arg) is seen
/// by the next push.
pub struct KeyGenArg {
    /// Existing key that countersigns the delegation. `None` only for an eldest key.
    pub signer: Option<Arc<KeyPair>>,
    /// How long the delegation is valid.
    pub expire_in: Duration,
    pub generator: Arc<dyn KeyGenerator>,
    pub identity: Arc<Identity>,
    pub is_sibkey: bool,
    /// Eldest key of the current epoch.
    pub eldest_kid: Option<Kid>,
    pub device: Option<Arc<Device>>,
    pub notifier: Arc<dyn Notifier>,
    /// Pre-computed reverse signature; the publisher makes one when absent.
    pub reverse_sig: Option<String>,
}

impl KeyGenArg {
    /// An eldest-key argument: no signer, no eldest kid, default expiry.
    pub fn new(
        generator: Arc<dyn KeyGenerator>,
        identity: Arc<Identity>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            signer: None,
            expire_in: DEFAULT_EXPIRE_IN,
            generator,
            identity,
            is_sibkey: false,
            eldest_kid: None,
            device: None,
            notifier,
            reverse_sig: None,
        }
    }

    pub fn with_signer(mut self, signer: Arc<KeyPair>) -> Self {
        self.signer = Some(signer);
        self
    }

    pub fn with_eldest_kid(mut self, eldest_kid: Kid) -> Self {
        self.eldest_kid = Some(eldest_kid);
        self
    }

    pub fn with_sibkey(mut self, is_sibkey: bool) -> Self {
        self.is_sibkey = is_sibkey;
        self
    }

    pub fn with_device(mut self, device: Arc<Device>) -> Self {
        self.device = Some(device);
        self
    }

    pub fn with_expire_in(mut self, expire_in: Duration) -> Self {
        self.expire_in = expire_in;
        self
    }

    pub fn with_reverse_sig(mut self, reverse_sig: impl Into<String>) -> Self {
        self.reverse_sig = Some(reverse_sig.into());
        self
    }
}

impl fmt::Debug for KeyGenArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyGenArg")
            .field("signer", &self.signer.as_ref().map(|s| &s.kid))
            .field("expire_in", &self.expire_in)
            .field("identity", &self.identity.name)
            .field("is_sibkey", &self.is_sibkey)
            .field("eldest_kid", &self.eldest_kid)
            .field("device", &self.device.as_ref().map(|d| &d.name))
            .field("reverse_sig", &self.reverse_sig.is_some())
            .finish_non_exhaustive()
    }
}
