//! Local key security (LKS): a locally held secret that seals private keys
//! before they reach the keyring.
//!
//! # Algorithms
//!
//! - **Key Derivation**: Argon2id from a passphrase and per-identity salt
//! - **Encryption**: ChaCha20-Poly1305, the bundle's key id bound as associated data

use argon2::{Algorithm, Argon2, Params, Version};
use chacha20poly1305::aead::{Aead, Payload};
use chacha20poly1305::{ChaCha20Poly1305, Key, KeyInit, Nonce};
use rand::rngs::OsRng;
use rand::RngCore;
use std::fmt;
use zeroize::Zeroizing;

use crate::error::KeyringError;

// =============================================================================
// Constants
// =============================================================================

/// Salt length for passphrase derivation (16 bytes)
pub const SALT_LEN: usize = 16;

/// Nonce length for ChaCha20-Poly1305 (12 bytes)
pub const NONCE_LEN: usize = 12;

/// LKS secret length (32 bytes)
pub const SECRET_LEN: usize = 32;

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LksParams {
    /// Memory cost in KiB
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for LksParams {
    /// 64 MB, 3 iterations, 4 lanes.
    fn default() -> Self {
        Self {
            memory_kib: 65536,
            iterations: 3,
            parallelism: 4,
        }
    }
}

/// A local key security context.
///
/// The `generation` is recorded in every bundle sealed with this context so a
/// rotated secret can be told apart from a wrong one.
pub struct LocalKeySecurity {
    secret: Zeroizing<[u8; SECRET_LEN]>,
    generation: u32,
}

impl LocalKeySecurity {
    pub fn new(secret: [u8; SECRET_LEN], generation: u32) -> Self {
        Self {
            secret: Zeroizing::new(secret),
            generation,
        }
    }

    /// Derive the LKS secret from a passphrase using Argon2id.
    pub fn from_passphrase(
        passphrase: &[u8],
        salt: &[u8],
        params: LksParams,
        generation: u32,
    ) -> Result<Self, KeyringError> {
        let params = Params::new(
            params.memory_kib,
            params.iterations,
            params.parallelism,
            Some(SECRET_LEN),
        )
        .map_err(|e| KeyringError::KeyDerivation(format!("invalid Argon2 params: {e}")))?;

        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let mut secret = Zeroizing::new([0u8; SECRET_LEN]);
        argon2
            .hash_password_into(passphrase, salt, &mut secret[..])
            .map_err(|e| KeyringError::KeyDerivation(e.to_string()))?;

        Ok(Self { secret, generation })
    }

    /// Fresh random salt for [`LocalKeySecurity::from_passphrase`].
    pub fn generate_salt() -> [u8; SALT_LEN] {
        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);
        salt
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    fn cipher(&self) -> ChaCha20Poly1305 {
        ChaCha20Poly1305::new(Key::from_slice(&self.secret[..]))
    }

    /// Encrypt `plaintext`, returning `(nonce, ciphertext)`.
    pub fn encrypt(&self, plaintext: &[u8], aad: &[u8]) -> Result<(Vec<u8>, Vec<u8>), KeyringError> {
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);

        let ciphertext = self
            .cipher()
            .encrypt(Nonce::from_slice(&nonce), Payload { msg: plaintext, aad })
            .map_err(|e| KeyringError::Encryption(e.to_string()))?;
        Ok((nonce.to_vec(), ciphertext))
    }

    pub fn decrypt(
        &self,
        nonce: &[u8],
        ciphertext: &[u8],
        aad: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>, KeyringError> {
        if nonce.len() != NONCE_LEN {
            return Err(KeyringError::MalformedSecret);
        }
        self.cipher()
            .decrypt(Nonce::from_slice(nonce), Payload { msg: ciphertext, aad })
            .map(Zeroizing::new)
            .map_err(|_| KeyringError::Decryption)
    }
}

impl fmt::Debug for LocalKeySecurity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalKeySecurity")
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}
