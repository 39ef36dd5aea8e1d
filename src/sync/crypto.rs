//! Sealed note blobs.
//!
//! Wire format: `"<sha256-hex>:<base64 json>"`, where the hash covers the JSON
//! text followed by the user's key. The payload is encoded, not enciphered; the
//! hash is what binds a blob to a key, so opening a blob with another key fails
//! the integrity check.

use base64::prelude::*;
use rand::RngCore;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::{AppError, AppResult};
use crate::platform::KeyValueStore;
use crate::storage::keys;

/// Key length in bytes before hex encoding.
pub const KEY_BYTES: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedBlob {
    pub hash: String,
    pub payload: String,
}

pub fn integrity_hash(json: &str, key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}

impl EncryptedBlob {
    pub fn seal(value: &Value, key: &str) -> AppResult<Self> {
        let json = serde_json::to_string(value)?;
        Ok(Self {
            hash: integrity_hash(&json, key),
            payload: BASE64_STANDARD.encode(json.as_bytes()),
        })
    }

    pub fn parse(wire: &str) -> AppResult<Self> {
        let (hash, payload) = wire
            .split_once(':')
            .ok_or_else(|| AppError::integrity_mismatch("blob has no hash separator"))?;
        Ok(Self {
            hash: hash.to_string(),
            payload: payload.to_string(),
        })
    }

    pub fn to_wire(&self) -> String {
        format!("{}:{}", self.hash, self.payload)
    }

    /// Decodes the payload and checks it against `key`. The plaintext is only
    /// returned when the recomputed hash matches.
    pub fn open(&self, key: &str) -> AppResult<Value> {
        let bytes = BASE64_STANDARD
            .decode(self.payload.as_bytes())
            .map_err(|e| AppError::integrity_mismatch(format!("payload is not base64: {}", e)))?;
        let json = String::from_utf8(bytes)
            .map_err(|e| AppError::integrity_mismatch(format!("payload is not UTF-8: {}", e)))?;
        if integrity_hash(&json, key) != self.hash {
            return Err(AppError::integrity_mismatch("Data integrity check failed"));
        }
        Ok(serde_json::from_str(&json)?)
    }
}

/// 32 random bytes, hex encoded.
pub fn generate_key() -> String {
    let mut bytes = [0u8; KEY_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Returns the stored key, creating and persisting one on first use.
pub async fn get_or_create_user_key(store: &dyn KeyValueStore) -> AppResult<String> {
    if let Some(key) = store.get(keys::ENCRYPTION_KEY).await? {
        if !key.is_empty() {
            return Ok(key);
        }
    }
    let key = generate_key();
    store.set(keys::ENCRYPTION_KEY, &key).await?;
    Ok(key)
}
