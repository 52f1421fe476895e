//! Whole-store persistence to a single JSON file.
//!
//! The file is one JSON object mapping table name to an array of record
//! objects. Every save rewrites it completely.

mod io_utils;

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::config::DbConfig;
use crate::error::DbError;
use crate::record::Record;

pub use io_utils::{classify_io_error, retry_io_operation};

/// Every table in the store, keyed by name.
pub type Tables = BTreeMap<String, Vec<Record>>;

/// Reads and writes the store file.
#[derive(Debug, Clone)]
pub struct PersistenceManager {
    /// Store file path
    data_file: PathBuf,
    /// Maximum retry attempts for transient I/O errors
    max_retries: u32,
    /// Delay between retry attempts in milliseconds
    retry_delay_ms: u64,
}

impl PersistenceManager {
    /// Creates a new persistence manager with the given configuration.
    pub fn new(config: &DbConfig) -> Self {
        Self {
            data_file: config.data_file.clone(),
            max_retries: config.persistence_max_retries,
            retry_delay_ms: config.persistence_retry_delay_ms,
        }
    }

    /// Path of the store file.
    pub fn data_file(&self) -> &Path {
        &self.data_file
    }

    /// Loads every table from disk.
    ///
    /// # Returns
    /// `Ok(None)` when the file does not exist yet, the parsed tables
    /// otherwise. A file that is not a table-name to record-array object
    /// yields [`DbError::SerializationError`].
    pub fn load(&self) -> Result<Option<Tables>, DbError> {
        let contents = match fs::read_to_string(&self.data_file) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(classify_io_error(e, "Failed to read store file")),
        };

        let tables: Tables = serde_json::from_str(&contents)
            .map_err(|e| DbError::SerializationError(format!("Failed to parse store: {}", e)))?;
        Ok(Some(tables))
    }

    /// Writes every table to disk, replacing the previous file.
    pub fn save(&self, tables: &Tables) -> Result<(), DbError> {
        retry_io_operation(
            || self.save_internal(tables),
            self.max_retries,
            self.retry_delay_ms,
            "save_store",
        )
    }

    fn save_internal(&self, tables: &Tables) -> Result<(), DbError> {
        let json = serde_json::to_string_pretty(tables)
            .map_err(|e| DbError::SerializationError(e.to_string()))?;

        if let Some(parent) = self.data_file.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| classify_io_error(e, "Failed to create data directory"))?;
            }
        }

        // Write to temporary file first
        let temp_path = self.temp_path();
        let mut file = File::create(&temp_path)
            .map_err(|e| classify_io_error(e, "Failed to create temp file"))?;
        file.write_all(json.as_bytes())
            .map_err(|e| classify_io_error(e, "Failed to write store"))?;
        file.sync_all()
            .map_err(|e| classify_io_error(e, "Failed to sync store"))?;

        fs::rename(&temp_path, &self.data_file)
            .map_err(|e| classify_io_error(e, "Failed to rename store file"))?;

        tracing::debug!("Persisted {} tables to {}", tables.len(), self.data_file.display());
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut path = self.data_file.clone().into_os_string();
        path.push(".tmp");
        PathBuf::from(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ntest::timeout;
    use serde_json::json;
    use tempfile::tempdir;

    fn manager(path: PathBuf) -> PersistenceManager {
        PersistenceManager::new(&DbConfig {
            data_file: path,
            ..Default::default()
        })
    }

    #[timeout(1000)]
    #[test]
    fn test_load_missing_file_returns_none() {
        let dir = tempdir().unwrap();
        let pm = manager(dir.path().join("db.json"));
        assert!(pm.load().unwrap().is_none());
    }

    #[timeout(1000)]
    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let pm = manager(dir.path().join("nested").join("db.json"));

        let mut tables = Tables::new();
        let row = json!({"id": "1", "nome": "Jinx"}).as_object().cloned().unwrap();
        tables.insert("champions".to_string(), vec![row]);
        pm.save(&tables).unwrap();

        let loaded = pm.load().unwrap().unwrap();
        assert_eq!(loaded, tables);
        assert!(!pm.temp_path().exists());

        // pretty-printed with two-space indentation
        let raw = fs::read_to_string(pm.data_file()).unwrap();
        assert!(raw.contains("\n  \"champions\""));
    }

    #[timeout(1000)]
    #[test]
    fn test_load_rejects_wrong_shape() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db.json");
        fs::write(&path, r#"{"champions": 5}"#).unwrap();

        let err = manager(path).load().unwrap_err();
        assert!(matches!(err, DbError::SerializationError(_)));
    }
}
