//! Store and aspect index integration tests.

use serde_json::{json, Value};
use tempfile::{tempdir, TempDir};

use champions_core::aspects::{self, AspectEntry, ASPECT_INDEX_TABLE};
use champions_core::champion::{Champion, CHAMPIONS_TABLE};
use champions_core::config::DbConfig;
use champions_core::{Database, Filter, Record};
use ntest::timeout;

fn open_temp() -> (TempDir, DbConfig, Database) {
    let dir = tempdir().unwrap();
    let config = DbConfig {
        data_file: dir.path().join("db.json"),
        ..Default::default()
    };
    let db = Database::open(&config).unwrap();
    (dir, config, db)
}

fn create(db: &mut Database, body: Value) -> Record {
    let record = Champion::from_body(&body).unwrap().into_record();
    let stored = db.insert(CHAMPIONS_TABLE, record);
    aspects::on_champion_created(db, &stored);
    stored
}

fn champion(nome: &str, aspectos: &[&str]) -> Value {
    json!({"nome": nome, "aspectos": aspectos, "custo": 1, "habilidade": "skill"})
}

#[timeout(1000)]
#[test]
fn test_insert_then_select_by_id_and_name() {
    let (_dir, _config, mut db) = open_temp();
    let stored = create(&mut db, champion("Jinx", &["Punk"]));

    let mut by_id = Filter::new();
    by_id.insert("id".to_string(), stored["id"].clone());
    assert_eq!(db.select(CHAMPIONS_TABLE, Some(&by_id)), vec![stored.clone()]);

    let mut by_name = Filter::new();
    by_name.insert("nome".to_string(), json!("Jinx"));
    assert_eq!(db.select(CHAMPIONS_TABLE, Some(&by_name)), vec![stored]);
}

#[timeout(1000)]
#[test]
fn test_slashes_stripped_and_indexed() {
    let (_dir, _config, mut db) = open_temp();
    let stored = create(
        &mut db,
        json!({"nome": "Jinx", "aspectos": ["Punk/", "EDM"], "custo": 3, "habilidade": "Zap"}),
    );

    assert_eq!(stored["aspectos"], json!(["Punk", "EDM"]));
    assert_eq!(aspects::names_for(&db, "Punk"), vec!["Jinx"]);
    assert_eq!(aspects::names_for(&db, "Punk/"), Vec::<String>::new());
    assert_eq!(aspects::all_aspects(&db), vec!["Punk", "EDM"]);
}

#[timeout(1000)]
#[test]
fn test_delete_removes_name_from_every_entry() {
    let (_dir, _config, mut db) = open_temp();
    let x = create(&mut db, champion("x", &["A", "B"]));
    create(&mut db, champion("y", &["A"]));

    let id = x["id"].as_str().unwrap().to_string();
    assert!(db.delete(CHAMPIONS_TABLE, &id));
    aspects::on_champion_deleted(&mut db, &x);

    assert_eq!(aspects::names_for(&db, "A"), vec!["y"]);
    assert!(aspects::names_for(&db, "B").is_empty());
    assert!(!db.delete(CHAMPIONS_TABLE, &id));
}

#[timeout(1000)]
#[test]
fn test_rebuild_is_idempotent() {
    let (_dir, _config, mut db) = open_temp();
    // bypass the incremental path so the index starts out stale
    for body in [champion("x", &["A", "B"]), champion("y", &["A", "B"])] {
        let record = Champion::from_body(&body).unwrap().into_record();
        db.insert(CHAMPIONS_TABLE, record);
    }
    assert!(aspects::all_aspects(&db).is_empty());

    let expected = vec![
        AspectEntry {
            aspecto: "A".to_string(),
            nomes: vec!["x".to_string(), "y".to_string()],
        },
        AspectEntry {
            aspecto: "B".to_string(),
            nomes: vec!["x".to_string(), "y".to_string()],
        },
    ];
    assert_eq!(aspects::rebuild_all(&mut db), expected);
    assert_eq!(aspects::rebuild_all(&mut db), expected);
    assert_eq!(db.count(ASPECT_INDEX_TABLE), 2);
}

#[timeout(1000)]
#[test]
fn test_rebuild_drops_emptied_entries() {
    let (_dir, _config, mut db) = open_temp();
    let x = create(&mut db, champion("x", &["Solo"]));
    db.delete(CHAMPIONS_TABLE, x["id"].as_str().unwrap());
    aspects::on_champion_deleted(&mut db, &x);
    assert_eq!(aspects::all_aspects(&db), vec!["Solo"]);

    aspects::rebuild_all(&mut db);
    assert!(aspects::all_aspects(&db).is_empty());
}

#[timeout(1000)]
#[test]
fn test_update_moves_index_membership() {
    let (_dir, _config, mut db) = open_temp();
    let before = create(&mut db, champion("x", &["A"]));
    let id = before["id"].as_str().unwrap().to_string();

    let patch = json!({"nome": "z", "aspectos": ["B"]});
    assert!(db.update(CHAMPIONS_TABLE, &id, patch.as_object().cloned().unwrap()));
    let after = db.find_by_id(CHAMPIONS_TABLE, &id).cloned().unwrap();
    aspects::on_champion_updated(&mut db, &before, &after);

    assert!(aspects::names_for(&db, "A").is_empty());
    assert_eq!(aspects::names_for(&db, "B"), vec!["z"]);
}

#[timeout(1000)]
#[test]
fn test_index_persists_across_reopen() {
    let (_dir, config, mut db) = open_temp();
    create(&mut db, champion("x", &["A"]));
    drop(db);

    let db = Database::open(&config).unwrap();
    assert_eq!(db.count(CHAMPIONS_TABLE), 1);
    assert_eq!(aspects::names_for(&db, "A"), vec!["x"]);
}
