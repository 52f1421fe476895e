//! The record store: named tables of schemaless records.
//!
//! All mutations rewrite the whole store file. Persistence failures are
//! logged and swallowed, so memory and disk may diverge until the next
//! successful save.

use crate::champion::{self, CHAMPIONS_TABLE};
use crate::config::DbConfig;
use crate::error::DbError;
use crate::persistence::{PersistenceManager, Tables};
use crate::record::{self, Filter, Record};

/// In-memory tables backed by a single JSON file.
#[derive(Debug)]
pub struct Database {
    /// Map of table name to its rows, in insertion order
    tables: Tables,
    persistence: PersistenceManager,
}

impl Database {
    /// Loads the store described by `config`.
    ///
    /// A missing or unparsable file starts an empty store, which is
    /// written out immediately.
    ///
    /// # Errors
    /// Any other read failure (permissions, a directory in the way, ...)
    /// is returned untouched so an unreadable store is never overwritten.
    pub fn open(config: &DbConfig) -> Result<Self, DbError> {
        let persistence = PersistenceManager::new(config);
        let path = persistence.data_file().display().to_string();

        match persistence.load() {
            Ok(Some(tables)) => {
                tracing::info!("Loaded {} tables from {}", tables.len(), path);
                return Ok(Self {
                    tables,
                    persistence,
                });
            }
            Ok(None) => tracing::info!("No store file at {}, starting empty", path),
            Err(DbError::SerializationError(msg)) => {
                tracing::warn!("Store file {} is corrupt, starting empty: {}", path, msg)
            }
            Err(e) => {
                tracing::error!("Failed to read store file {}: {}", path, e);
                return Err(e);
            }
        }

        let db = Self {
            tables: Tables::new(),
            persistence,
        };
        db.persist();
        Ok(db)
    }

    /// Returns the rows of `table` matching `filter`, or all rows.
    ///
    /// An absent table is an empty result.
    pub fn select(&self, table: &str, filter: Option<&Filter>) -> Vec<Record> {
        let Some(rows) = self.tables.get(table) else {
            return Vec::new();
        };
        match filter {
            Some(filter) => rows
                .iter()
                .filter(|row| record::matches(row, filter))
                .cloned()
                .collect(),
            None => rows.clone(),
        }
    }

    /// Finds the row whose `id` equals `id`.
    pub fn find_by_id(&self, table: &str, id: &str) -> Option<&Record> {
        self.tables
            .get(table)?
            .iter()
            .find(|row| record::record_id(row) == Some(id))
    }

    /// Number of rows in `table`.
    pub fn count(&self, table: &str) -> usize {
        self.tables.get(table).map_or(0, Vec::len)
    }

    /// Names of every table present.
    pub fn table_names(&self) -> Vec<String> {
        self.tables.keys().cloned().collect()
    }

    /// Appends `record` to `table`, creating the table if needed.
    ///
    /// Champion tags have their `/` characters stripped. The caller is
    /// responsible for assigning the `id`.
    ///
    /// # Returns
    /// The record as stored.
    pub fn insert(&mut self, table: &str, mut record: Record) -> Record {
        if table == CHAMPIONS_TABLE {
            champion::normalize_record(&mut record);
        }
        self.tables
            .entry(table.to_string())
            .or_default()
            .push(record.clone());
        self.persist();
        record
    }

    /// Shallow-merges `patch` into the row with the given id.
    ///
    /// # Returns
    /// `false` (with a logged diagnostic) when the table or row is absent.
    pub fn update(&mut self, table: &str, id: &str, patch: Record) -> bool {
        let Some(rows) = self.tables.get_mut(table) else {
            tracing::warn!("Table {} not found", table);
            return false;
        };
        let Some(row) = rows
            .iter_mut()
            .find(|row| record::record_id(row) == Some(id))
        else {
            tracing::warn!("Record with id {} not found in table {}", id, table);
            return false;
        };

        row.extend(patch);
        self.persist();
        true
    }

    /// Removes the row with the given id.
    ///
    /// # Returns
    /// `false` (with a logged diagnostic) when the table or row is absent.
    pub fn delete(&mut self, table: &str, id: &str) -> bool {
        let Some(rows) = self.tables.get_mut(table) else {
            tracing::warn!("Table {} not found", table);
            return false;
        };
        let Some(index) = rows
            .iter()
            .position(|row| record::record_id(row) == Some(id))
        else {
            tracing::warn!("Record with id {} not found in table {}", id, table);
            return false;
        };

        rows.remove(index);
        self.persist();
        true
    }

    /// Replaces the contents of `table` in a single write.
    pub fn replace_table(&mut self, table: &str, rows: Vec<Record>) {
        self.tables.insert(table.to_string(), rows);
        self.persist();
    }

    fn persist(&self) {
        if let Err(e) = self.persistence.save(&self.tables) {
            tracing::error!(
                "Failed to persist store to {}: {}",
                self.persistence.data_file().display(),
                e
            );
        }
    }
}
