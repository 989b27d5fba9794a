//! Profile storage: local JSON file or the remote document store.

use crate::error::{Result, StoreError};
use crate::firestore::RemoteDocStore;
use async_trait::async_trait;
use mietbot_core::{AppConfig, UserProfile};
use std::path::PathBuf;

/// Where applicant profiles live.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Idempotent setup.
    async fn initialize(&self) -> Result<()>;

    /// Load and validate one profile. The file store has exactly one
    /// profile and ignores the key.
    async fn load_profile(&self, key: &str) -> Result<UserProfile>;

    /// Keys of every stored profile.
    async fn list_profiles(&self) -> Result<Vec<String>>;

    /// Store a profile under the given key (upsert).
    async fn save_profile(&self, key: &str, profile: &UserProfile) -> Result<()>;

    /// Backend name for operator logs.
    fn name(&self) -> &'static str;
}

/// One profile in one JSON file.
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    /// Store over the given profile file.
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl ConfigStore for FileConfigStore {
    async fn initialize(&self) -> Result<()> {
        Ok(())
    }

    async fn load_profile(&self, _key: &str) -> Result<UserProfile> {
        Ok(UserProfile::load_from_file(&self.path)?)
    }

    async fn list_profiles(&self) -> Result<Vec<String>> {
        if self.path.exists() {
            Ok(vec![self.path.display().to_string()])
        } else {
            Ok(Vec::new())
        }
    }

    async fn save_profile(&self, _key: &str, profile: &UserProfile) -> Result<()> {
        Ok(profile.save_to_file(&self.path)?)
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

/// One document per profile key in the remote profile collection.
pub struct RemoteConfigStore {
    store: RemoteDocStore,
    collection: String,
}

impl RemoteConfigStore {
    /// Store over the given document store and collection.
    #[must_use]
    pub fn new(store: RemoteDocStore, collection: String) -> Self {
        Self { store, collection }
    }
}

#[async_trait]
impl ConfigStore for RemoteConfigStore {
    async fn initialize(&self) -> Result<()> {
        let _ = self
            .store
            .document_exists(&self.collection, "connectivity-probe")
            .await?;
        Ok(())
    }

    async fn load_profile(&self, key: &str) -> Result<UserProfile> {
        let fields = self.store.get_document(&self.collection, key).await?;
        let profile: UserProfile =
            serde_json::from_value(fields).map_err(|e| StoreError::MalformedDocument {
                key: format!("{}/{key}", self.collection),
                reason: e.to_string(),
            })?;
        profile.validate().map_err(StoreError::from)?;
        Ok(profile)
    }

    async fn list_profiles(&self) -> Result<Vec<String>> {
        self.store.list_document_ids(&self.collection).await
    }

    async fn save_profile(&self, key: &str, profile: &UserProfile) -> Result<()> {
        let fields = serde_json::to_value(profile)?;
        self.store
            .upsert_document(&self.collection, key, &fields)
            .await?;
        tracing::info!(key = %key, collection = %self.collection, "profile stored remotely");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}

/// Build the profile store the config selects.
pub fn build_config_store(config: &AppConfig) -> Result<Box<dyn ConfigStore>> {
    match config.store.profile_source.as_str() {
        "file" => Ok(Box::new(FileConfigStore::new(profile_path(config)?))),
        "remote" => {
            let store = RemoteDocStore::from_config(&config.remote)?;
            Ok(Box::new(RemoteConfigStore::new(
                store,
                config.remote.profile_collection.clone(),
            )))
        }
        other => Err(StoreError::InvalidConfig {
            field: "store.profile_source",
            reason: format!("unknown profile source {other:?} (expected \"file\" or \"remote\")"),
        }),
    }
}

fn profile_path(config: &AppConfig) -> Result<PathBuf> {
    if let Some(path) = &config.store.profile_path {
        return Ok(path.clone());
    }
    let config_path = AppConfig::config_path().map_err(|e| StoreError::InvalidConfig {
        field: "store.profile_path",
        reason: e.to_string(),
    })?;
    Ok(config_path.with_file_name("profile.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_profile() -> UserProfile {
        UserProfile {
            emails: vec!["anna@example.com".to_string()],
            first_name: "Anna".to_string(),
            last_name: "Muster".to_string(),
            max_rent: 1200.0,
            min_size: 50.0,
            min_rooms: 2,
            ..UserProfile::default()
        }
    }

    #[tokio::test]
    async fn test_file_store_roundtrip_ignores_key() {
        let tmp = TempDir::new().expect("create temp dir");
        let store = FileConfigStore::new(tmp.path().join("profile.json"));

        store
            .save_profile("whatever", &sample_profile())
            .await
            .expect("save");
        let loaded = store.load_profile("other-key").await.expect("load");
        assert_eq!(loaded.first_name, "Anna");

        let listed = store.list_profiles().await.expect("list");
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn test_file_store_missing_profile() {
        let tmp = TempDir::new().expect("create temp dir");
        let store = FileConfigStore::new(tmp.path().join("absent.json"));
        assert!(store.load_profile("any").await.is_err());
        assert!(store.list_profiles().await.expect("list").is_empty());
    }

    #[test]
    fn test_build_file_store() {
        let mut config = AppConfig::default();
        config.store.profile_path = Some(PathBuf::from("/tmp/mietbot-test-profile.json"));
        let store = build_config_store(&config).expect("build");
        assert_eq!(store.name(), "file");
    }

    #[test]
    fn test_build_remote_store_requires_project_id() {
        let mut config = AppConfig::default();
        config.store.profile_source = "remote".to_string();
        assert!(matches!(
            build_config_store(&config),
            Err(StoreError::MissingParameter { .. })
        ));
    }

    #[test]
    fn test_build_unknown_source_is_error() {
        let mut config = AppConfig::default();
        config.store.profile_source = "clipboard".to_string();
        assert!(matches!(
            build_config_store(&config),
            Err(StoreError::InvalidConfig { .. })
        ));
    }
}
