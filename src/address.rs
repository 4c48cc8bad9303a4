//! Address and identifier derivation

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::Network;

/// Number of digest bytes kept in an address
pub const ADDRESS_HASH_LEN: usize = 20;

/// Prefix of stealth account addresses
pub const STEALTH_PREFIX: &str = "stealth_";

/// Derive the address for a hex-encoded public key.
///
/// The address is the network prefix followed by the hex of the first
/// [`ADDRESS_HASH_LEN`] bytes of SHA-256 over the raw key bytes.
pub fn generate_address(public_key: &str, network: Network) -> Result<String> {
    let key_bytes = hex::decode(public_key)
        .map_err(|e| Error::InvalidParameter(format!("invalid public key hex: {}", e)))?;
    if key_bytes.is_empty() {
        return Err(Error::InvalidParameter("public key is empty".to_string()));
    }
    Ok(address_from_bytes(&key_bytes, network))
}

/// Derive the address for raw public key bytes.
pub fn address_from_bytes(public_key: &[u8], network: Network) -> String {
    let hash = Sha256::digest(public_key);
    format!(
        "{}{}",
        network.address_prefix(),
        hex::encode(&hash[..ADDRESS_HASH_LEN])
    )
}

/// Derive a stealth account address from a view key and spend public key.
pub fn stealth_address(view_key: &str, spend_public_key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(view_key.as_bytes());
    hasher.update(spend_public_key.as_bytes());
    let hash = hasher.finalize();
    format!("{}{}", STEALTH_PREFIX, hex::encode(&hash[..ADDRESS_HASH_LEN]))
}

/// Check that `address` is well formed for `network`.
pub fn is_valid_address(address: &str, network: Network) -> bool {
    address
        .strip_prefix(network.address_prefix())
        .map_or(false, |body| {
            body.len() == ADDRESS_HASH_LEN * 2
                && body.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
        })
}

/// Random unique identifier. Carries no meaning; do not parse it.
pub fn generate_tx_id() -> String {
    Uuid::new_v4().to_string()
}
