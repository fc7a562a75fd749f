use icn_identity::Kid;
use thiserror::Error;

/// Errors raised while writing or reading the keyring.
#[derive(Debug, Error)]
pub enum KeyringError {
    #[error("failed to encode secret key bundle: {0}")]
    Encode(#[source] serde_cbor::Error),

    #[error("failed to decode secret key bundle: {0}")]
    Decode(#[source] serde_cbor::Error),

    #[error("local key security derivation failed: {0}")]
    KeyDerivation(String),

    #[error("failed to encrypt secret key: {0}")]
    Encryption(String),

    #[error("failed to decrypt secret key: wrong local key security secret or tampered bundle")]
    Decryption,

    #[error("bundle sealed under local key security generation {found}, context is generation {expected}")]
    GenerationMismatch { expected: u32, found: u32 },

    #[error("key {0} is protected by local key security; a security context is required")]
    LocalKeySecurityRequired(Kid),

    #[error("secret key material is malformed")]
    MalformedSecret,

    #[error("unlocked key {found} does not match bundle key {expected}")]
    KeyMismatch { expected: Kid, found: Kid },

    #[error("keyring backend error: {0}")]
    Backend(String),
}
