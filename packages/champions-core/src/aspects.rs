//! Derived index from aspect (tag) to the names of champions carrying it.
//!
//! The index lives in its own table and is kept current by incremental
//! updates on champion create, update and delete. Each update rewrites
//! the index table once. Nothing ties the champion write and the index
//! write together, so [`rebuild_all`] exists to recompute it from scratch.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::champion::{self, CHAMPIONS_TABLE};
use crate::database::Database;
use crate::record::Record;

/// Table holding the derived index.
pub const ASPECT_INDEX_TABLE: &str = "aspectosComCampeoes";

/// One row of the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AspectEntry {
    pub aspecto: String,
    pub nomes: Vec<String>,
}

/// Clears the index and recomputes it from every champion.
///
/// Entries appear in the order their tag is first seen. Rows without a
/// usable `nome`/`aspectos` pair are skipped.
pub fn rebuild_all(db: &mut Database) -> Vec<AspectEntry> {
    let mut entries = Vec::new();
    for row in db.select(CHAMPIONS_TABLE, None) {
        match champion::index_fields(&row) {
            Some((nome, aspectos)) => add_name(&mut entries, nome, &aspectos),
            None => tracing::warn!("Skipping champion without nome/aspectos: {:?}", row.get("id")),
        }
    }
    tracing::info!("Rebuilt aspect index with {} entries", entries.len());
    store_entries(db, &entries);
    entries
}

/// Adds the champion's name under each of its tags.
pub fn on_champion_created(db: &mut Database, champion: &Record) {
    let Some((nome, aspectos)) = champion::index_fields(champion) else {
        return;
    };
    let mut entries = load_entries(db);
    add_name(&mut entries, nome, &aspectos);
    store_entries(db, &entries);
}

/// Removes the champion's name from every entry.
pub fn on_champion_deleted(db: &mut Database, champion: &Record) {
    let Some((nome, _)) = champion::index_fields(champion) else {
        return;
    };
    let mut entries = load_entries(db);
    remove_name(&mut entries, nome);
    store_entries(db, &entries);
}

/// Moves a champion's index membership from `before` to `after`.
pub fn on_champion_updated(db: &mut Database, before: &Record, after: &Record) {
    let old = champion::index_fields(before);
    let new = champion::index_fields(after);
    if old == new {
        return;
    }

    let mut entries = load_entries(db);
    if let Some((nome, _)) = old {
        remove_name(&mut entries, nome);
    }
    if let Some((nome, aspectos)) = new {
        add_name(&mut entries, nome, &aspectos);
    }
    store_entries(db, &entries);
}

/// Names of the champions carrying `aspecto`; empty for an unknown tag.
pub fn names_for(db: &Database, aspecto: &str) -> Vec<String> {
    load_entries(db)
        .into_iter()
        .find(|entry| entry.aspecto == aspecto)
        .map(|entry| entry.nomes)
        .unwrap_or_default()
}

/// Every tag present in the index.
pub fn all_aspects(db: &Database) -> Vec<String> {
    load_entries(db)
        .into_iter()
        .map(|entry| entry.aspecto)
        .collect()
}

fn load_entries(db: &Database) -> Vec<AspectEntry> {
    db.select(ASPECT_INDEX_TABLE, None)
        .into_iter()
        .filter_map(
            |row| match serde_json::from_value::<AspectEntry>(Value::Object(row)) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!("Dropping malformed aspect index row: {}", e);
                    None
                }
            },
        )
        .collect()
}

fn store_entries(db: &mut Database, entries: &[AspectEntry]) {
    let rows = entries
        .iter()
        .filter_map(|entry| match serde_json::to_value(entry) {
            Ok(Value::Object(row)) => Some(row),
            Ok(other) => {
                tracing::error!("Aspect index entry is not an object: {}", other);
                None
            }
            Err(e) => {
                tracing::error!("Failed to serialize aspect index entry: {}", e);
                None
            }
        })
        .collect();
    db.replace_table(ASPECT_INDEX_TABLE, rows);
}

fn add_name(entries: &mut Vec<AspectEntry>, nome: &str, aspectos: &[&str]) {
    for &aspecto in aspectos {
        match entries.iter_mut().find(|entry| entry.aspecto == aspecto) {
            Some(entry) => {
                if !entry.nomes.iter().any(|n| n == nome) {
                    entry.nomes.push(nome.to_string());
                }
            }
            None => entries.push(AspectEntry {
                aspecto: aspecto.to_string(),
                nomes: vec![nome.to_string()],
            }),
        }
    }
}

fn remove_name(entries: &mut [AspectEntry], nome: &str) {
    for entry in entries.iter_mut() {
        entry.nomes.retain(|n| n != nome);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DbConfig;
    use serde_json::json;
    use tempfile::tempdir;

    fn entry(aspecto: &str, nomes: &[&str]) -> AspectEntry {
        AspectEntry {
            aspecto: aspecto.to_string(),
            nomes: nomes.iter().map(|n| n.to_string()).collect(),
        }
    }

    #[test]
    fn test_add_name_creates_and_extends_entries() {
        let mut entries = Vec::new();
        add_name(&mut entries, "Jinx", &["Punk", "EDM"]);
        add_name(&mut entries, "Vi", &["Punk"]);
        assert_eq!(
            entries,
            vec![entry("Punk", &["Jinx", "Vi"]), entry("EDM", &["Jinx"])]
        );
    }

    #[test]
    fn test_add_name_skips_repeats() {
        let mut entries = Vec::new();
        add_name(&mut entries, "Jinx", &["Punk", "Punk"]);
        add_name(&mut entries, "Jinx", &["Punk"]);
        assert_eq!(entries, vec![entry("Punk", &["Jinx"])]);
    }

    #[test]
    fn test_remove_name_keeps_emptied_entries() {
        let mut entries = vec![entry("Punk", &["Jinx", "Vi"]), entry("EDM", &["Jinx"])];
        remove_name(&mut entries, "Jinx");
        assert_eq!(entries, vec![entry("Punk", &["Vi"]), entry("EDM", &[])]);
    }

    #[test]
    fn test_stored_entries_are_plain_rows() {
        let dir = tempdir().unwrap();
        let mut db = Database::open(&DbConfig {
            data_file: dir.path().join("db.json"),
            ..Default::default()
        })
        .unwrap();

        let entries = vec![entry("Punk", &["Jinx", "Vi"]), entry("EDM", &[])];
        store_entries(&mut db, &entries);

        let rows = db.select(ASPECT_INDEX_TABLE, None);
        assert_eq!(rows.len(), 2);
        assert_eq!(
            Value::Object(rows[0].clone()),
            json!({"aspecto": "Punk", "nomes": ["Jinx", "Vi"]})
        );
        assert_eq!(
            Value::Object(rows[1].clone()),
            json!({"aspecto": "EDM", "nomes": []})
        );
        assert_eq!(load_entries(&db), entries);
    }
}
