use super::*;

// =============================================================
// MemoryStore
// =============================================================

#[test]
fn memory_store_set_get_remove() {
    let store = MemoryStore::new();
    assert_eq!(store.get("user").unwrap(), None);

    store.set("user", "{}").unwrap();
    assert_eq!(store.get("user").unwrap().as_deref(), Some("{}"));

    store.remove("user").unwrap();
    assert_eq!(store.get("user").unwrap(), None);

    // Removing again is fine.
    store.remove("user").unwrap();
}

#[test]
fn load_json_reports_decode_errors_with_key() {
    let store = MemoryStore::new();
    store.set("user", "{not json").unwrap();

    let err = load_json::<serde_json::Value>(&store, "user").unwrap_err();
    assert!(matches!(err, StorageError::Decode { ref key, .. } if key == "user"));
}

#[test]
fn save_json_then_load_json() {
    let store = MemoryStore::new();
    save_json(&store, "numbers", &vec![1, 2, 3]).unwrap();
    let loaded: Option<Vec<i32>> = load_json(&store, "numbers").unwrap();
    assert_eq!(loaded, Some(vec![1, 2, 3]));
    assert_eq!(load_json::<Vec<i32>>(&store, "missing").unwrap(), None);
}

// =============================================================
// FileStore
// =============================================================

#[test]
fn file_store_missing_file_reads_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path().join("store.json"));
    assert_eq!(store.get("theme").unwrap(), None);
    store.remove("theme").unwrap();
    assert!(!store.path().exists());
}

#[test]
fn file_store_persists_across_instances() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("store.json");

    let store = FileStore::new(&path);
    store.set("theme", "dark").unwrap();
    store.set("user", r#"{"token":"t1"}"#).unwrap();
    drop(store);

    let reopened = FileStore::new(&path);
    assert_eq!(reopened.get("theme").unwrap().as_deref(), Some("dark"));
    assert_eq!(reopened.get("user").unwrap().as_deref(), Some(r#"{"token":"t1"}"#));

    reopened.remove("user").unwrap();
    assert_eq!(reopened.get("user").unwrap(), None);
    assert_eq!(reopened.get("theme").unwrap().as_deref(), Some("dark"));
}

#[test]
fn file_store_rejects_non_object_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");
    std::fs::write(&path, "[1,2,3]").unwrap();

    let store = FileStore::new(&path);
    assert!(matches!(store.get("user"), Err(StorageError::Corrupt { .. })));
}

#[test]
fn file_store_empty_file_reads_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");
    std::fs::write(&path, "  \n").unwrap();

    let store = FileStore::new(&path);
    assert_eq!(store.get("user").unwrap(), None);
}

#[test]
fn file_store_write_replaces_corrupt_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");
    std::fs::write(&path, "{garbage").unwrap();

    let store = FileStore::new(&path);
    assert!(matches!(store.get("user"), Err(StorageError::Corrupt { .. })));

    store.set("theme", "dark").unwrap();
    assert_eq!(store.get("theme").unwrap().as_deref(), Some("dark"));
    assert_eq!(FileStore::new(&path).get("theme").unwrap().as_deref(), Some("dark"));
}

#[test]
fn file_store_remove_repairs_corrupt_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");
    std::fs::write(&path, "[1,2,3]").unwrap();

    let store = FileStore::new(&path);
    store.remove("user").unwrap();
    assert_eq!(store.get("user").unwrap(), None);
}
