use crate::Kid;
use ed25519_dalek::{Signer, Verifier};
use std::fmt;
use zeroize::Zeroizing;

pub type Signature = ed25519_dalek::Signature;

/// Ed25519 keypair identified by its `Kid`.
///
/// Equality compares key ids only.
#[derive(Clone)]
pub struct KeyPair {
    pub kid: Kid,
    pub pk: ed25519_dalek::VerifyingKey,
    sk: ed25519_dalek::SigningKey,
}

impl KeyPair {
    /// Rebuild a keypair from its 32-byte secret seed.
    pub fn from_secret_bytes(secret: &[u8; 32]) -> Self {
        let sk = ed25519_dalek::SigningKey::from_bytes(secret);
        let pk = sk.verifying_key();
        let kid = Kid::from_verifying_key(&pk);
        Self { kid, pk, sk }
    }

    /// Sign arbitrary bytes, returning an Ed25519 signature.
    pub fn sign(&self, msg: &[u8]) -> Signature {
        self.sk.sign(msg)
    }

    /// Verify a signature against `msg`.
    pub fn verify(&self, msg: &[u8], sig: &Signature) -> bool {
        self.pk.verify(msg, sig).is_ok()
    }

    /// The secret seed. Wiped from memory when the returned buffer drops.
    pub fn secret_bytes(&self) -> Zeroizing<[u8; 32]> {
        Zeroizing::new(self.sk.to_bytes())
    }

    pub fn public_bytes(&self) -> [u8; 32] {
        self.pk.to_bytes()
    }
}

impl PartialEq for KeyPair {
    fn eq(&self, other: &Self) -> bool {
        self.kid == other.kid
    }
}

impl Eq for KeyPair {}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair").field("kid", &self.kid).finish_non_exhaustive()
    }
}
