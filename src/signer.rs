//! Signing capability used by the transaction lifecycle

use ed25519_dalek::{Signature, Signer as _, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use secrecy::{ExposeSecret, SecretString};

use crate::error::{Error, Result};

/// Produces signatures over canonical transaction bytes.
///
/// The lifecycle treats this as opaque; implement it to plug in hardware
/// wallets or remote signers.
pub trait Signer: Send + Sync {
    /// Hex-encoded public key matching the signatures this signer produces.
    fn public_key(&self) -> String;

    fn sign(&self, message: &[u8]) -> Result<Vec<u8>>;
}

/// Ed25519 signer over a 32-byte secret key
pub struct Ed25519Signer {
    key: SigningKey,
}

impl Ed25519Signer {
    /// Generate a fresh key from the OS random source.
    pub fn generate() -> Self {
        Self {
            key: SigningKey::generate(&mut OsRng),
        }
    }

    pub fn from_bytes(secret: &[u8; 32]) -> Self {
        Self {
            key: SigningKey::from_bytes(secret),
        }
    }

    /// Load from a hex-encoded 32-byte secret key.
    pub fn from_hex(secret: &str) -> Result<Self> {
        let bytes = hex::decode(secret.trim())
            .map_err(|e| Error::KeyDerivation(format!("invalid private key hex: {}", e)))?;
        let secret: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
            Error::KeyDerivation(format!(
                "invalid private key length: expected 32 bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self::from_bytes(&secret))
    }

    pub(crate) fn from_secret(secret: &SecretString) -> Result<Self> {
        Self::from_hex(secret.expose_secret())
    }

    /// Hex-encoded secret key, wrapped so it is redacted from debug output.
    pub fn secret_hex(&self) -> SecretString {
        SecretString::new(hex::encode(self.key.to_bytes()))
    }
}

impl Signer for Ed25519Signer {
    fn public_key(&self) -> String {
        hex::encode(self.key.verifying_key().to_bytes())
    }

    fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        Ok(self.key.sign(message).to_bytes().to_vec())
    }
}

/// Verify a hex signature against a hex Ed25519 public key.
pub fn verify_signature(public_key: &str, message: &[u8], signature: &str) -> Result<bool> {
    let key_bytes: [u8; 32] = hex::decode(public_key)?
        .as_slice()
        .try_into()
        .map_err(|_| Error::InvalidParameter("public key must be 32 bytes".to_string()))?;
    let key = VerifyingKey::from_bytes(&key_bytes)
        .map_err(|e| Error::Crypto(format!("invalid public key: {}", e)))?;
    let sig_bytes: [u8; 64] = hex::decode(signature)?
        .as_slice()
        .try_into()
        .map_err(|_| Error::InvalidParameter("signature must be 64 bytes".to_string()))?;
    Ok(key.verify(message, &Signature::from_bytes(&sig_bytes)).is_ok())
}
