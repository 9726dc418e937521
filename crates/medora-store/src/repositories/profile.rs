use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::{Mutex, RwLock},
};

use serde_json::Value;

use crate::{ProfilePatch, StoreError, migration::migrate_profile, models::UserProfile};

use super::ProfileStore;

/// Profiles held in process memory, keyed by user id.
#[derive(Debug, Default)]
pub struct InMemoryProfileStore {
    profiles: RwLock<HashMap<String, UserProfile>>,
}

impl ProfileStore for InMemoryProfileStore {
    fn load_profile(&self, user_id: &str) -> Result<UserProfile, StoreError> {
        let profiles = self.profiles.read().map_err(|_| StoreError::Poisoned)?;
        profiles
            .get(user_id)
            .cloned()
            .ok_or_else(|| StoreError::ProfileNotFound(user_id.to_string()))
    }

    fn create_profile(&self, user_id: &str, profile: &UserProfile) -> Result<(), StoreError> {
        let mut profiles = self.profiles.write().map_err(|_| StoreError::Poisoned)?;
        if profiles.contains_key(user_id) {
            return Err(StoreError::ProfileExists(user_id.to_string()));
        }
        profiles.insert(user_id.to_string(), profile.clone());
        Ok(())
    }

    fn save_profile_fields(&self, user_id: &str, patch: &ProfilePatch) -> Result<(), StoreError> {
        let mut profiles = self.profiles.write().map_err(|_| StoreError::Poisoned)?;
        let profile = profiles
            .get_mut(user_id)
            .ok_or_else(|| StoreError::ProfileNotFound(user_id.to_string()))?;
        patch.apply(profile);
        Ok(())
    }
}

/// One JSON document per user under a directory.
///
/// Documents written by older versions are migrated on every read, so a
/// legacy file is upgraded the first time a patch is saved to it.
#[derive(Debug)]
pub struct JsonFileProfileStore {
    dir: PathBuf,
    // Serializes read-modify-write cycles on the same process
    write_lock: Mutex<()>,
}

impl JsonFileProfileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    fn path_for(&self, user_id: &str) -> PathBuf {
        self.dir.join(format!("{user_id}.json"))
    }

    fn read(path: &Path, user_id: &str) -> Result<UserProfile, StoreError> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::ProfileNotFound(user_id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        let document: Value = serde_json::from_str(&raw)?;
        Ok(migrate_profile(document)?)
    }

    fn write(&self, path: &Path, profile: &UserProfile) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(profile)?)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

impl ProfileStore for JsonFileProfileStore {
    fn load_profile(&self, user_id: &str) -> Result<UserProfile, StoreError> {
        Self::read(&self.path_for(user_id), user_id)
    }

    fn create_profile(&self, user_id: &str, profile: &UserProfile) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::Poisoned)?;
        let path = self.path_for(user_id);
        if path.exists() {
            return Err(StoreError::ProfileExists(user_id.to_string()));
        }
        self.write(&path, profile)
    }

    fn save_profile_fields(&self, user_id: &str, patch: &ProfilePatch) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::Poisoned)?;
        let path = self.path_for(user_id);
        let mut profile = Self::read(&path, user_id)?;
        patch.apply(&mut profile);
        self.write(&path, &profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PROFILE_SCHEMA_VERSION;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "medora-store-{name}-{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_in_memory_round_trip() {
        let store = InMemoryProfileStore::default();
        store
            .create_profile("u1", &UserProfile::new("Ada", "ada@example.com"))
            .unwrap();
        store
            .save_profile_fields(
                "u1",
                &ProfilePatch {
                    xp: Some(42),
                    ..ProfilePatch::default()
                },
            )
            .unwrap();

        assert_eq!(store.load_profile("u1").unwrap().xp, 42);
        assert!(matches!(
            store.load_profile("u2"),
            Err(StoreError::ProfileNotFound(_))
        ));
    }

    #[test]
    fn test_json_file_store_upgrades_legacy_document() {
        let dir = temp_dir("legacy");
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("u1.json"),
            r#"{"name":"Demo Student","email":"demo@example.com","streak":2,"lastStudyDate":""}"#,
        )
        .unwrap();

        let store = JsonFileProfileStore::new(&dir);
        store
            .save_profile_fields(
                "u1",
                &ProfilePatch {
                    xp: Some(10),
                    ..ProfilePatch::default()
                },
            )
            .unwrap();

        let raw: Value =
            serde_json::from_str(&fs::read_to_string(dir.join("u1.json")).unwrap()).unwrap();
        assert_eq!(raw["schemaVersion"], PROFILE_SCHEMA_VERSION);
        assert_eq!(raw["xp"], 10);
        assert_eq!(raw["streak"], 2);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_json_file_store_create_twice_fails() {
        let dir = temp_dir("create");
        let store = JsonFileProfileStore::new(&dir);
        let profile = UserProfile::new("Ada", "ada@example.com");

        store.create_profile("u1", &profile).unwrap();
        assert!(matches!(
            store.create_profile("u1", &profile),
            Err(StoreError::ProfileExists(_))
        ));
        assert_eq!(store.load_profile("u1").unwrap(), profile);

        fs::remove_dir_all(&dir).unwrap();
    }
}
