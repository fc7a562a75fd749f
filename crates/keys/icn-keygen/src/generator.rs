use icn_identity::KeyPair;
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroizing;

use crate::error::GenerateError;

/// Produces fresh keypairs.
///
/// Any `Fn() -> Result<KeyPair, GenerateError>` closure is a generator.
pub trait KeyGenerator: Send + Sync {
    fn generate(&self) -> Result<KeyPair, GenerateError>;
}

impl<F> KeyGenerator for F
where
    F: Fn() -> Result<KeyPair, GenerateError> + Send + Sync,
{
    fn generate(&self) -> Result<KeyPair, GenerateError> {
        self()
    }
}

/// Ed25519 keys seeded from the operating system RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct Ed25519Generator;

impl KeyGenerator for Ed25519Generator {
    fn generate(&self) -> Result<KeyPair, GenerateError> {
        let mut seed = Zeroizing::new([0u8; 32]);
        OsRng
            .try_fill_bytes(&mut seed[..])
            .map_err(|e| GenerateError::Entropy(e.to_string()))?;
        Ok(KeyPair::from_secret_bytes(&seed))
    }
}
