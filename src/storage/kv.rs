//! Key-value store of JSON blobs backed by a single file.
//!
//! Every operation reads the whole map and writes it back through a temp
//! file, so a crash mid-write leaves the previous contents intact.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use super::StorageError;

pub struct KvStore {
    path: PathBuf,
}

impl KvStore {
    /// Open a store at `path`. The file is created on first write.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Map<String, Value>, StorageError> {
        if !self.path.exists() {
            return Ok(Map::new());
        }

        let contents = fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(Map::new());
        }

        let value: Value = serde_json::from_str(&contents)?;
        match value {
            Value::Object(map) => Ok(map),
            _ => Err(StorageError::Corrupt(self.path.clone())),
        }
    }

    fn persist(&self, map: &Map<String, Value>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = self.path.with_extension("json.tmp");
        {
            let file = File::create(&tmp_path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, map)?;
            writer.flush()?;
        }
        fs::rename(&tmp_path, &self.path)?;

        Ok(())
    }

    /// Read a value. A present value that does not match `T` is an error,
    /// so callers never overwrite data they failed to read.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        let mut map = self.load()?;
        let Some(value) = map.remove(key) else {
            debug!("No value stored for {}", key);
            return Ok(None);
        };

        let value = serde_json::from_value(value).map_err(|source| StorageError::Unreadable {
            key: key.to_string(),
            source,
        })?;
        debug!("Retrieved {}", key);
        Ok(Some(value))
    }

    /// Read a value, falling back to `default` when absent.
    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> Result<T, StorageError> {
        Ok(self.get(key)?.unwrap_or(default))
    }

    /// Store a value, replacing any previous one.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let mut map = self.load()?;
        map.insert(key.to_string(), serde_json::to_value(value)?);
        self.persist(&map)?;

        debug!("Saved {}", key);
        Ok(())
    }

    /// Remove keys. Returns how many were present.
    pub fn remove(&self, keys: &[&str]) -> Result<usize, StorageError> {
        let mut map = self.load()?;
        let removed = keys.iter().filter(|k| map.remove(**k).is_some()).count();

        if removed > 0 {
            self.persist(&map)?;
        }

        debug!("Removed {} of {:?}", removed, keys);
        Ok(removed)
    }

    /// Remove everything.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.persist(&Map::new())?;
        debug!("Cleared all data in {:?}", self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct TestEntity {
        name: String,
        value: u32,
    }

    fn store(temp_dir: &TempDir) -> KvStore {
        KvStore::new(temp_dir.path().join("nested").join("storage.json"))
    }

    #[test]
    fn test_set_and_get() {
        let temp_dir = TempDir::new().unwrap();
        let kv = store(&temp_dir);

        let entity = TestEntity {
            name: "First".to_string(),
            value: 100,
        };
        kv.set("entity", &entity).unwrap();

        assert_eq!(kv.get::<TestEntity>("entity").unwrap(), Some(entity));
        assert!(kv.path().exists());
    }

    #[test]
    fn test_get_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let kv = store(&temp_dir);

        assert_eq!(kv.get::<TestEntity>("entity").unwrap(), None);
        assert_eq!(kv.get_or("count", 7u32).unwrap(), 7);
    }

    #[test]
    fn test_mismatched_value_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let kv = store(&temp_dir);

        kv.set("entity", &"not an entity").unwrap();
        assert!(matches!(
            kv.get::<TestEntity>("entity"),
            Err(StorageError::Unreadable { .. })
        ));
        assert!(kv.get_or("entity", 0u32).is_err());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("storage.json");
        fs::write(&path, "[1, 2, 3]").unwrap();

        let kv = KvStore::new(path);
        assert!(matches!(
            kv.get::<u32>("anything"),
            Err(StorageError::Corrupt(_))
        ));
    }

    #[test]
    fn test_remove() {
        let temp_dir = TempDir::new().unwrap();
        let kv = store(&temp_dir);

        kv.set("a", &1u32).unwrap();
        kv.set("b", &2u32).unwrap();

        assert_eq!(kv.remove(&["a", "missing"]).unwrap(), 1);
        assert_eq!(kv.get::<u32>("a").unwrap(), None);
        assert_eq!(kv.get::<u32>("b").unwrap(), Some(2));
    }

    #[test]
    fn test_clear() {
        let temp_dir = TempDir::new().unwrap();
        let kv = store(&temp_dir);

        kv.set("a", &1u32).unwrap();
        kv.clear().unwrap();

        assert_eq!(kv.get::<u32>("a").unwrap(), None);
        assert_eq!(fs::read_to_string(kv.path()).unwrap().trim(), "{}");
    }

    #[test]
    fn test_no_temp_file_left_behind() {
        let temp_dir = TempDir::new().unwrap();
        let kv = store(&temp_dir);

        kv.set("a", &1u32).unwrap();
        assert!(!kv.path().with_extension("json.tmp").exists());
    }
}
