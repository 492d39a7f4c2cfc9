//! Credential store — CRUD and persistence for provider API keys.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use scenecast_core::ApiKey;

/// Environment fallback for the official provider's key.
const OFFICIAL_KEY_ENV: &str = "SCENECAST_API_KEY";

/// Key record with the secret masked, for listings.
#[derive(Debug, Clone, Serialize)]
pub struct MaskedKey {
    pub id: String,
    pub name: String,
    pub provider: String,
    pub enabled: bool,
    #[serde(rename = "keyPreview")]
    pub key_preview: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

fn mask(key: &str) -> String {
    if key.len() <= 4 {
        "****".into()
    } else {
        format!("****{}", &key[key.len() - 4..])
    }
}

/// Persisted set of provider credentials.
pub struct KeyStore {
    keys: Vec<ApiKey>,
    store_path: PathBuf,
}

impl KeyStore {
    /// Load the store from disk, starting empty if the file is absent.
    pub fn load(store_path: &Path) -> Self {
        let keys = match std::fs::read_to_string(store_path) {
            Ok(data) => serde_json::from_str(&data).unwrap_or_default(),
            Err(_) => Vec::new(),
        };
        info!("KeyStore: {} credentials loaded", keys.len());

        Self {
            keys,
            store_path: store_path.to_path_buf(),
        }
    }

    fn save(&self) {
        if let Ok(data) = serde_json::to_string_pretty(&self.keys) {
            if let Err(e) = std::fs::write(&self.store_path, data) {
                warn!("Failed to save API keys: {}", e);
            }
        }
    }

    /// List all keys with secrets masked.
    pub fn list(&self) -> Vec<MaskedKey> {
        self.keys
            .iter()
            .map(|k| MaskedKey {
                id: k.id.clone(),
                name: k.name.clone(),
                provider: k.provider.clone(),
                enabled: k.enabled,
                key_preview: mask(&k.key),
                created_at: k.created_at.clone(),
            })
            .collect()
    }

    /// Add a credential and persist.
    pub fn add(&mut self, name: &str, key: &str, provider: &str) -> ApiKey {
        let record = ApiKey {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            key: key.to_string(),
            provider: provider.to_string(),
            enabled: true,
            created_at: chrono::Utc::now().to_rfc3339(),
        };
        self.keys.push(record.clone());
        self.save();
        record
    }

    /// Delete a credential. Returns true if found.
    pub fn remove(&mut self, id: &str) -> bool {
        let len_before = self.keys.len();
        self.keys.retain(|k| k.id != id);
        let deleted = self.keys.len() < len_before;
        if deleted {
            self.save();
        }
        deleted
    }

    /// Enable or disable a credential. Returns the updated record.
    pub fn set_enabled(&mut self, id: &str, enabled: bool) -> Option<ApiKey> {
        let record = self.keys.iter_mut().find(|k| k.id == id)?;
        record.enabled = enabled;
        let updated = record.clone();
        self.save();
        Some(updated)
    }

    /// First enabled credential for a provider.
    ///
    /// The official provider falls back to `SCENECAST_API_KEY` when no
    /// stored credential matches, so environment-configured deployments
    /// work without touching the store.
    pub fn active_key(&self, provider: &str) -> Option<ApiKey> {
        let stored = self
            .keys
            .iter()
            .find(|k| k.provider == provider && k.enabled)
            .cloned();
        if stored.is_some() {
            return stored;
        }

        if provider == "official" {
            if let Ok(key) = std::env::var(OFFICIAL_KEY_ENV) {
                return Some(ApiKey {
                    id: "env".into(),
                    name: "environment".into(),
                    key,
                    provider: provider.to_string(),
                    enabled: true,
                    created_at: String::new(),
                });
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_store(dir: &Path) -> KeyStore {
        KeyStore::load(&dir.join("api-keys.json"))
    }

    #[test]
    fn test_add_and_list_masked() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = test_store(dir.path());

        let record = store.add("My key", "sk-verysecret1234", "fal.ai");
        assert!(record.enabled);

        let listed = store.list();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].key_preview, "****1234");
        assert_eq!(listed[0].provider, "fal.ai");
    }

    #[test]
    fn test_active_key_is_first_enabled_match() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = test_store(dir.path());

        let first = store.add("first", "key-one", "kie.ai");
        store.add("second", "key-two", "kie.ai");
        store.add("other", "key-three", "fal.ai");

        let active = store.active_key("kie.ai").unwrap();
        assert_eq!(active.id, first.id);
        assert_eq!(active.key, "key-one");
    }

    #[test]
    fn test_disabled_keys_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = test_store(dir.path());

        let first = store.add("first", "key-one", "fal.ai");
        let second = store.add("second", "key-two", "fal.ai");
        store.set_enabled(&first.id, false);

        let active = store.active_key("fal.ai").unwrap();
        assert_eq!(active.id, second.id);
    }

    #[test]
    fn test_remove() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = test_store(dir.path());

        let record = store.add("gone", "key", "fal.ai");
        assert!(store.remove(&record.id));
        assert!(!store.remove(&record.id));
        assert!(store.active_key("fal.ai").is_none());
    }

    #[test]
    fn test_persistence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("api-keys.json");

        {
            let mut store = KeyStore::load(&path);
            store.add("persisted", "key-persist", "kie.ai");
        }

        let store = KeyStore::load(&path);
        let listed = store.list();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "persisted");
    }

    #[test]
    fn test_mask_short_keys() {
        assert_eq!(mask("ab"), "****");
        assert_eq!(mask("abcdefgh"), "****efgh");
    }
}
