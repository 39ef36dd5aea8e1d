//! Persisted keys and typed access helpers over a [`KeyValueStore`].

pub mod keys;
pub mod memory;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::AppResult;
use crate::platform::KeyValueStore;

pub use memory::MemoryStore;

/// Reads a `"true"`/`"false"` flag; anything else counts as false.
pub async fn get_flag(store: &dyn KeyValueStore, key: &str) -> AppResult<bool> {
    Ok(store.get(key).await?.as_deref() == Some("true"))
}

pub async fn set_flag(store: &dyn KeyValueStore, key: &str, value: bool) -> AppResult<()> {
    store.set(key, if value { "true" } else { "false" }).await
}

pub async fn get_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> AppResult<Option<T>> {
    match store.get(key).await? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

pub async fn set_json<T: Serialize + ?Sized>(store: &dyn KeyValueStore, key: &str, value: &T) -> AppResult<()> {
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_flag_round_trip() {
        let store = MemoryStore::new();
        assert!(!get_flag(&store, keys::SYNC_NOTES_STATUS).await.unwrap());

        set_flag(&store, keys::SYNC_NOTES_STATUS, true).await.unwrap();
        assert!(get_flag(&store, keys::SYNC_NOTES_STATUS).await.unwrap());
        assert_eq!(store.get(keys::SYNC_NOTES_STATUS).await.unwrap().as_deref(), Some("true"));
    }

    #[tokio::test]
    async fn test_unexpected_flag_value_is_false() {
        let store = MemoryStore::new();
        store.set(keys::NOTIFICATIONS_SCHEDULED, "yes").await.unwrap();
        assert!(!get_flag(&store, keys::NOTIFICATIONS_SCHEDULED).await.unwrap());
    }

    #[tokio::test]
    async fn test_get_json_reports_corrupt_values() {
        let store = MemoryStore::new();
        store.set(keys::NOTES, "{not json").await.unwrap();
        let result: AppResult<Option<Vec<String>>> = get_json(&store, keys::NOTES).await;
        assert!(result.is_err());
    }
}
