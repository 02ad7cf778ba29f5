//! Key/value storage for credentials and the cached user profile
//!
//! [`CredentialStore`] is the typed view the request pipeline uses. It sits
//! on top of any [`KeyValueStore`]: [`MemoryStore`] for tests and embedded
//! use, [`FileStore`] for a durable store that survives process restarts.

use crate::error::{CoreError, CoreResult};
use crate::types::{Credential, UserInfo};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tracing::warn;

/// Storage key for the bearer token
pub const TOKEN_KEY: &str = "token";

/// Storage key for the refresh token
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

/// Storage key for the cached user profile (JSON)
pub const USER_INFO_KEY: &str = "userInfo";

/// Minimal string key/value store
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> CoreResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> CoreResult<()>;
    fn remove(&self, key: &str) -> CoreResult<()>;
}

/// Process-local store backed by a map
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> CoreResult<Option<String>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> CoreResult<()> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> CoreResult<()> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

/// Durable store persisting a flat JSON object to a single file
///
/// Every write rewrites the whole file through a temporary sibling that is
/// renamed into place, so a reader never sees a half-written file. On Unix
/// the file is readable by its owner only. A file that does not parse is
/// treated as empty and replaced on the next write.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    /// Open a store at `path`; the file is created on first write
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> CoreResult<BTreeMap<String, String>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(err) => return Err(err.into()),
        };
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        match serde_json::from_str(&content) {
            Ok(entries) => Ok(entries),
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "credential file is corrupt; discarding it");
                Ok(BTreeMap::new())
            }
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> CoreResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(entries)?;
        let tmp_path = self.temp_path();
        std::fs::write(&tmp_path, content)?;

        // Tokens are secrets: owner read/write only
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(0o600))?;
        }

        #[cfg(not(unix))]
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> CoreResult<Option<String>> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> CoreResult<()> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.load()?;
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries)
    }

    fn remove(&self, key: &str) -> CoreResult<()> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.load()?;
        entries.remove(key);
        self.persist(&entries)
    }
}

/// Typed access to the stored credential and user profile
#[derive(Clone)]
pub struct CredentialStore {
    backend: Arc<dyn KeyValueStore>,
}

impl CredentialStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    /// Store backed by process memory
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Store backed by a JSON file
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(FileStore::new(path)))
    }

    /// Current credential, if a bearer token is stored
    pub fn credential(&self) -> CoreResult<Option<Credential>> {
        let Some(token) = self.backend.get(TOKEN_KEY)? else {
            return Ok(None);
        };
        if token.is_empty() {
            return Ok(None);
        }
        let refresh_token = self.backend.get(REFRESH_TOKEN_KEY)?;
        Ok(Some(Credential::new(token, refresh_token)))
    }

    pub fn refresh_token(&self) -> CoreResult<Option<String>> {
        self.backend.get(REFRESH_TOKEN_KEY)
    }

    /// Persist a credential, replacing any previous one
    ///
    /// A credential without a refresh token removes the stored refresh token.
    pub fn save(&self, credential: &Credential) -> CoreResult<()> {
        self.backend.set(TOKEN_KEY, &credential.token)?;
        match &credential.refresh_token {
            Some(refresh_token) => self.backend.set(REFRESH_TOKEN_KEY, refresh_token),
            None => self.backend.remove(REFRESH_TOKEN_KEY),
        }
    }

    pub fn user_info(&self) -> CoreResult<Option<UserInfo>> {
        match self.backend.get(USER_INFO_KEY)? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| CoreError::serialization_error(format!("stored user info: {e}"))),
            None => Ok(None),
        }
    }

    pub fn save_user_info(&self, user: &UserInfo) -> CoreResult<()> {
        let raw = serde_json::to_string(user)?;
        self.backend.set(USER_INFO_KEY, &raw)
    }

    /// Remove the credential and the cached user profile
    pub fn clear(&self) -> CoreResult<()> {
        self.backend.remove(TOKEN_KEY)?;
        self.backend.remove(REFRESH_TOKEN_KEY)?;
        self.backend.remove(USER_INFO_KEY)
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> UserInfo {
        UserInfo {
            id: 7,
            username: "admin".to_string(),
            nickname: "Administrator".to_string(),
            avatar: None,
            roles: vec!["admin".to_string()],
        }
    }

    #[test]
    fn empty_store_has_no_credential() {
        let store = CredentialStore::in_memory();
        assert_eq!(store.credential().unwrap(), None);
        assert_eq!(store.user_info().unwrap(), None);
    }

    #[test]
    fn save_and_clear_round_trip() {
        let store = CredentialStore::in_memory();
        store
            .save(&Credential::new("access", Some("refresh".to_string())))
            .unwrap();
        store.save_user_info(&sample_user()).unwrap();

        let credential = store.credential().unwrap().unwrap();
        assert_eq!(credential.token, "access");
        assert_eq!(credential.refresh_token.as_deref(), Some("refresh"));
        assert_eq!(store.user_info().unwrap(), Some(sample_user()));

        store.clear().unwrap();
        assert_eq!(store.credential().unwrap(), None);
        assert_eq!(store.refresh_token().unwrap(), None);
        assert_eq!(store.user_info().unwrap(), None);
    }

    #[test]
    fn saving_without_refresh_token_drops_the_old_one() {
        let store = CredentialStore::in_memory();
        store
            .save(&Credential::new("first", Some("refresh".to_string())))
            .unwrap();
        store.save(&Credential::new("second", None)).unwrap();

        assert_eq!(store.refresh_token().unwrap(), None);
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("credentials.json");

        CredentialStore::file(&path)
            .save(&Credential::new("persisted", None))
            .unwrap();

        let reopened = CredentialStore::file(&path);
        assert_eq!(reopened.credential().unwrap().unwrap().token, "persisted");

        reopened.clear().unwrap();
        assert_eq!(CredentialStore::file(&path).credential().unwrap(), None);
        assert!(!dir.path().join("nested").join("credentials.json.tmp").exists());
    }

    #[test]
    fn truncated_file_does_not_lock_the_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, r#"{"token": "abc"#).unwrap();
        let store = CredentialStore::file(&path);

        assert_eq!(store.credential().unwrap(), None);
        store.clear().unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(serde_json::from_str::<BTreeMap<String, String>>(&content).is_ok());

        std::fs::write(&path, "{\"token\": ").unwrap();
        store
            .save(&Credential::new("fresh", Some("refresh".to_string())))
            .unwrap();
        assert_eq!(
            CredentialStore::file(&path).credential().unwrap().unwrap().token,
            "fresh"
        );
    }

    #[cfg(unix)]
    #[test]
    fn credential_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        CredentialStore::file(&path)
            .save(&Credential::new("secret", Some("refresh".to_string())))
            .unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn corrupt_user_info_is_a_serialization_error() {
        let backend = Arc::new(MemoryStore::new());
        backend.set(USER_INFO_KEY, "{not json").unwrap();
        let store = CredentialStore::new(backend);

        assert!(matches!(
            store.user_info(),
            Err(CoreError::Serialization { .. })
        ));
    }
}
