//! Stealth addresses and encrypted memos
//!
//! Key agreement is X25519; memos are sealed with ChaCha20-Poly1305 under a
//! SHA-256 digest of the shared point. Only public key material is ever sent
//! to the node.

use std::fmt;

use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Nonce};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};
use x25519_dalek::{PublicKey, StaticSecret};

use crate::address::stealth_address;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::rpc::{optional_str, required_str, RpcClient};

/// Size of the ChaCha20-Poly1305 nonce in bytes
pub const NONCE_SIZE: usize = 12;

/// Size of the Poly1305 authentication tag in bytes
pub const TAG_SIZE: usize = 16;

/// Hex-encoded X25519 key pair
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPair {
    pub public: String,
    pub secret: String,
}

impl KeyPair {
    pub fn generate() -> Self {
        let secret = StaticSecret::random_from_rng(OsRng);
        let public = PublicKey::from(&secret);
        Self {
            public: hex::encode(public.as_bytes()),
            secret: hex::encode(secret.to_bytes()),
        }
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &self.public)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// View and spend key pairs of a stealth identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StealthKeys {
    pub view_keypair: KeyPair,
    pub spend_keypair: KeyPair,
}

impl StealthKeys {
    /// The public halves, safe to hand to the node.
    pub fn public_keys(&self) -> StealthPublicKeys {
        StealthPublicKeys {
            view_public: self.view_keypair.public.clone(),
            spend_public: self.spend_keypair.public.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StealthPublicKeys {
    pub view_public: String,
    pub spend_public: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StealthAccount {
    pub address: String,
    #[serde(default)]
    pub view_key: String,
    #[serde(default)]
    pub spend_public_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keys: Option<StealthKeys>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrivacyLevel {
    Stealth,
    Encrypted,
}

#[derive(Debug, Clone)]
pub struct PrivateTransactionRequest {
    pub sender_keys: StealthKeys,
    pub amount: String,
    pub fee: String,
    pub memo: Option<String>,
    pub privacy_level: PrivacyLevel,
    pub nonce: u64,
}

fn decode_key(hex_key: &str, what: &str) -> Result<[u8; 32]> {
    let bytes = hex::decode(hex_key.trim())
        .map_err(|e| Error::InvalidParameter(format!("invalid {} hex: {}", what, e)))?;
    bytes
        .as_slice()
        .try_into()
        .map_err(|_| Error::InvalidParameter(format!("{} must be 32 bytes", what)))
}

/// Privacy operations
#[derive(Debug, Clone)]
pub struct PrivacyManager {
    rpc: RpcClient,
}

impl PrivacyManager {
    pub fn new(rpc: RpcClient) -> Self {
        Self { rpc }
    }

    /// Generate fresh view and spend key pairs.
    pub fn generate_stealth_keys(&self) -> StealthKeys {
        StealthKeys {
            view_keypair: KeyPair::generate(),
            spend_keypair: KeyPair::generate(),
        }
    }

    /// Build a stealth account; the address is derived from both public keys.
    pub fn create_stealth_account(
        &self,
        view_key: &str,
        spend_public_key: &str,
        keys: Option<StealthKeys>,
    ) -> StealthAccount {
        StealthAccount {
            address: stealth_address(view_key, spend_public_key),
            view_key: view_key.to_string(),
            spend_public_key: spend_public_key.to_string(),
            keys,
        }
    }

    /// X25519 shared secret between our view secret and the peer's view
    /// public key, hashed with SHA-256 and hex-encoded. Both parties derive
    /// the same value.
    pub fn derive_shared_secret(&self, view_secret: &str, peer_view_public: &str) -> Result<String> {
        let secret = StaticSecret::from(decode_key(view_secret, "view secret")?);
        let public = PublicKey::from(decode_key(peer_view_public, "view public key")?);
        let shared = secret.diffie_hellman(&public);
        Ok(hex::encode(Sha256::digest(shared.as_bytes())))
    }

    /// Encrypt a memo; output is hex(nonce ‖ ciphertext ‖ tag).
    pub fn encrypt_memo(&self, memo: &str, shared_secret: &str) -> Result<String> {
        let cipher = Self::cipher(shared_secret)?;
        let mut nonce = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce);
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce), memo.as_bytes())
            .map_err(|_| Error::Crypto("memo encryption failed".to_string()))?;

        let mut out = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&ciphertext);
        Ok(hex::encode(out))
    }

    /// Decrypt a memo produced by [`encrypt_memo`](Self::encrypt_memo).
    pub fn decrypt_memo(&self, encrypted_memo: &str, shared_secret: &str) -> Result<String> {
        let data = hex::decode(encrypted_memo)
            .map_err(|e| Error::Crypto(format!("invalid encrypted memo: {}", e)))?;
        if data.len() < NONCE_SIZE + TAG_SIZE {
            return Err(Error::Crypto("encrypted memo too short".to_string()));
        }
        let (nonce, ciphertext) = data.split_at(NONCE_SIZE);
        let plaintext = Self::cipher(shared_secret)?
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| Error::Crypto("memo authentication failed".to_string()))?;
        String::from_utf8(plaintext).map_err(|_| Error::Crypto("memo is not valid UTF-8".to_string()))
    }

    fn cipher(shared_secret: &str) -> Result<ChaCha20Poly1305> {
        let key = hex::decode(shared_secret)
            .map_err(|e| Error::Crypto(format!("invalid shared secret: {}", e)))?;
        ChaCha20Poly1305::new_from_slice(&key)
            .map_err(|_| Error::Crypto("shared secret must be 32 bytes".to_string()))
    }

    /// Send a private transfer to the holder of the given stealth keys.
    /// Returns the transaction id.
    ///
    /// The memo key is agreed between a fresh ephemeral view key and the
    /// recipient's view key. The recipient recovers it with
    /// [`derive_shared_secret`](Self::derive_shared_secret) from its own view
    /// secret and `ephemeral_keys.view_public`.
    pub async fn send_private_transaction(
        &self,
        ctx: &Context,
        request: &PrivateTransactionRequest,
        recipient_view_key: &str,
        recipient_spend_key: &str,
    ) -> Result<String> {
        let ephemeral = self.generate_stealth_keys();
        let shared_secret =
            self.derive_shared_secret(&ephemeral.view_keypair.secret, recipient_view_key)?;

        let mut tx = json!({
            "sender_keys": request.sender_keys.public_keys(),
            "recipient_view_key": recipient_view_key,
            "recipient_spend_key": recipient_spend_key,
            "ephemeral_keys": ephemeral.public_keys(),
            "amount": request.amount,
            "fee": request.fee,
            "privacy_level": request.privacy_level,
            "nonce": request.nonce,
        });
        if let Some(memo) = request.memo.as_deref().filter(|m| !m.is_empty()) {
            tx["encrypted_memo"] = json!(self.encrypt_memo(memo, &shared_secret)?);
        }

        let result: Map<String, Value> = self
            .rpc
            .call(ctx, "sendPrivateTransaction", json!([tx]))
            .await?;
        required_str(&result, "tx_id", "private transaction")
    }

    /// Ask the node to generate a stealth address.
    pub async fn generate_stealth_address(
        &self,
        ctx: &Context,
        include_secrets: bool,
    ) -> Result<StealthAccount> {
        let params = json!({ "include_secrets": include_secrets });
        let result: Map<String, Value> = self
            .rpc
            .call(ctx, "privacy_generateStealthAddress", json!([params]))
            .await?;

        const WHAT: &str = "stealth address";
        let keys = match result.get("keys") {
            Some(keys) if include_secrets && !keys.is_null() => Some(
                serde_json::from_value::<StealthKeys>(keys.clone()).map_err(Error::ResultShape)?,
            ),
            _ => None,
        };

        Ok(StealthAccount {
            address: required_str(&result, "address", WHAT)?,
            view_key: optional_str(&result, "view_key", WHAT)?.unwrap_or_default(),
            spend_public_key: optional_str(&result, "spend_public_key", WHAT)?.unwrap_or_default(),
            keys,
        })
    }
}
