use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use ed25519_dalek::{Signature, SignatureError as Ed25519SignatureError, Verifier};
use icn_identity::{KeyPair, Kid, KidError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error types for statement signatures
#[derive(Error, Debug)]
pub enum SigError {
    #[error("Failed to serialize signature header: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Base64 encoding/decoding error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Invalid signature structure: expected 3 parts separated by '.', found {actual_parts} parts")]
    IncorrectPartsCount { actual_parts: usize },

    #[error("Invalid detached signature: payload part was expected to be empty but was not")]
    PayloadPresent,

    #[error("Invalid signature length: expected {expected_len} bytes, found {found_len} bytes")]
    InvalidSignatureLength { expected_len: usize, found_len: usize },

    #[error("Signature was made by {found}, expected {expected}")]
    KidMismatch { expected: Kid, found: String },

    #[error("Signing key id is unusable: {0}")]
    Kid(#[from] KidError),

    #[error("Cryptographic signature verification failed: {0}")]
    CryptoVerification(#[from] Ed25519SignatureError),
}

#[derive(Serialize, Deserialize)]
struct SigHeader {
    alg: String,
    kid: String,
}

/// Sign a statement and return a detached signature
/// `<base64url(header)>..<base64url(signature)>`; the header names the signing key.
pub fn sign_statement(payload: &[u8], key: &KeyPair) -> Result<String, SigError> {
    let header = SigHeader {
        alg: "EdDSA".to_string(),
        kid: key.kid.to_string(),
    };
    let header_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header)?);

    let signing_input = format!("{}.{}", header_b64, URL_SAFE_NO_PAD.encode(payload));
    let signature = key.sign(signing_input.as_bytes());

    Ok(format!("{}..{}", header_b64, URL_SAFE_NO_PAD.encode(signature.to_bytes())))
}

/// Verify a detached signature over `payload` made by the key `kid`.
pub fn verify_statement(payload: &[u8], detached: &str, kid: &Kid) -> Result<(), SigError> {
    let parts: Vec<&str> = detached.split('.').collect();
    if parts.len() != 3 {
        return Err(SigError::IncorrectPartsCount { actual_parts: parts.len() });
    }
    if !parts[1].is_empty() {
        return Err(SigError::PayloadPresent);
    }

    let header: SigHeader = serde_json::from_slice(&URL_SAFE_NO_PAD.decode(parts[0])?)?;
    if header.kid != kid.as_str() {
        return Err(SigError::KidMismatch {
            expected: kid.clone(),
            found: header.kid,
        });
    }

    let sig_bytes = URL_SAFE_NO_PAD.decode(parts[2])?;
    let sig_array: [u8; 64] = sig_bytes
        .as_slice()
        .try_into()
        .map_err(|_| SigError::InvalidSignatureLength {
            expected_len: 64,
            found_len: sig_bytes.len(),
        })?;
    let signature = Signature::from_bytes(&sig_array);

    let signing_input = format!("{}.{}", parts[0], URL_SAFE_NO_PAD.encode(payload));
    kid.to_verifying_key()?
        .verify(signing_input.as_bytes(), &signature)?;
    Ok(())
}
