use memory_core::db::{open_db, open_db_in_memory, DbError};
use memory_core::{
    MemoryListQuery, MemoryRepository, MemoryValidationError, NewMemory, RepoError,
    SqliteMemoryRepository,
};
use rusqlite::params;
use std::thread::sleep;
use std::time::Duration;

fn tick() {
    // Timestamps carry millisecond resolution.
    sleep(Duration::from_millis(5));
}

#[test]
fn upsert_and_get_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemoryRepository::new(&conn);

    let stored = repo.upsert_memory(&NewMemory::new("greeting", "hello")).unwrap();
    assert_eq!(stored.key, "greeting");
    assert_eq!(stored.created_at, stored.updated_at);

    let loaded = repo.get_memory("greeting").unwrap().unwrap();
    assert_eq!(loaded, stored);
    assert_eq!(loaded.value, "hello");
    assert_eq!(loaded.metadata, None);
}

#[test]
fn get_missing_key_returns_none() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemoryRepository::new(&conn);

    assert!(repo.get_memory("never-stored").unwrap().is_none());
}

#[test]
fn upsert_existing_key_updates_in_place_and_keeps_created_at() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemoryRepository::new(&conn);

    let first = repo
        .upsert_memory(&NewMemory::new("k", "v1").with_metadata(r#"{"rev":1}"#))
        .unwrap();
    tick();
    let second = repo.upsert_memory(&NewMemory::new("k", "v2")).unwrap();

    assert_eq!(second.value, "v2");
    assert_eq!(second.metadata, None);
    assert_eq!(second.created_at, first.created_at);
    assert!(second.updated_at > first.updated_at);
    assert!(second.updated_at >= second.created_at);

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM memories;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn upsert_never_moves_updated_at_backwards() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemoryRepository::new(&conn);

    repo.upsert_memory(&NewMemory::new("k", "v1")).unwrap();
    conn.execute(
        "UPDATE memories SET updated_at = '9999-12-31 23:59:59.999' WHERE key = 'k';",
        [],
    )
    .unwrap();

    let updated = repo.upsert_memory(&NewMemory::new("k", "v2")).unwrap();
    assert_eq!(updated.value, "v2");
    assert_eq!(updated.updated_at, "9999-12-31 23:59:59.999");
}

#[test]
fn upsert_rejects_invalid_input_without_writing() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemoryRepository::new(&conn);

    repo.upsert_memory(&NewMemory::new("k", "original")).unwrap();

    let err = repo
        .upsert_memory(&NewMemory::new("k", "changed").with_metadata("not valid json"))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(MemoryValidationError::InvalidMetadata(_))
    ));

    let err = repo.upsert_memory(&NewMemory::new("", "value")).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(MemoryValidationError::EmptyKey)
    ));

    let loaded = repo.get_memory("k").unwrap().unwrap();
    assert_eq!(loaded.value, "original");
    assert!(repo.get_memory("").unwrap().is_none());
}

#[test]
fn metadata_is_persisted_as_raw_text() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemoryRepository::new(&conn);

    repo.upsert_memory(&NewMemory::new("k", "v").with_metadata(r#"{ "tag" : "x" }"#))
        .unwrap();
    repo.upsert_memory(&NewMemory::new("empty", "v").with_metadata(""))
        .unwrap();

    let raw: String = conn
        .query_row(
            "SELECT metadata FROM memories WHERE key = ?1;",
            params!["k"],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(raw, r#"{ "tag" : "x" }"#);

    let empty = repo.get_memory("empty").unwrap().unwrap();
    assert_eq!(empty.metadata, None);
}

#[test]
fn list_orders_by_updated_at_desc_and_applies_limit() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemoryRepository::new(&conn);

    for key in ["a", "b", "c"] {
        repo.upsert_memory(&NewMemory::new(key, key)).unwrap();
        tick();
    }

    let all = repo.list_memories(&MemoryListQuery::default()).unwrap();
    let keys: Vec<&str> = all.iter().map(|record| record.key.as_str()).collect();
    assert_eq!(keys, vec!["c", "b", "a"]);

    let limited = repo.list_memories(&MemoryListQuery::with_limit(2)).unwrap();
    let keys: Vec<&str> = limited.iter().map(|record| record.key.as_str()).collect();
    assert_eq!(keys, vec!["c", "b"]);

    repo.upsert_memory(&NewMemory::new("a", "touched")).unwrap();
    let first = repo.list_memories(&MemoryListQuery::with_limit(1)).unwrap();
    assert_eq!(first[0].key, "a");
}

#[test]
fn list_breaks_timestamp_ties_by_key() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemoryRepository::new(&conn);

    for key in ["zeta", "alpha", "mid"] {
        repo.upsert_memory(&NewMemory::new(key, "v")).unwrap();
    }
    conn.execute(
        "UPDATE memories SET updated_at = '2026-01-01 00:00:00.000';",
        [],
    )
    .unwrap();

    let all = repo.list_memories(&MemoryListQuery::default()).unwrap();
    let keys: Vec<&str> = all.iter().map(|record| record.key.as_str()).collect();
    assert_eq!(keys, vec!["alpha", "mid", "zeta"]);
}

#[test]
fn list_limit_larger_than_table_returns_everything() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemoryRepository::new(&conn);

    repo.upsert_memory(&NewMemory::new("only", "v")).unwrap();
    let all = repo.list_memories(&MemoryListQuery::with_limit(50)).unwrap();
    assert_eq!(all.len(), 1);

    let all = repo
        .list_memories(&MemoryListQuery::with_limit(5_000_000_000))
        .unwrap();
    assert_eq!(all.len(), 1);

    let all = repo
        .list_memories(&MemoryListQuery::with_limit(u64::MAX))
        .unwrap();
    assert_eq!(all.len(), 1);
}

#[test]
fn whitespace_only_key_is_a_regular_key() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemoryRepository::new(&conn);

    repo.upsert_memory(&NewMemory::new(" ", "space")).unwrap();
    repo.upsert_memory(&NewMemory::new("  ", "two spaces")).unwrap();

    assert_eq!(repo.get_memory(" ").unwrap().unwrap().value, "space");
    assert_eq!(repo.get_memory("  ").unwrap().unwrap().value, "two spaces");
    assert_eq!(repo.delete_memory(" ").unwrap(), 1);
    assert!(repo.get_memory(" ").unwrap().is_none());
}

#[test]
fn writes_blocked_by_another_connection_report_busy() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("memory.db");

    let holder = open_db(&path).unwrap();
    let writer = open_db(&path).unwrap();
    writer.busy_timeout(Duration::ZERO).unwrap();
    holder.execute_batch("BEGIN EXCLUSIVE;").unwrap();

    let repo = SqliteMemoryRepository::new(&writer);
    let err = repo.upsert_memory(&NewMemory::new("k", "v")).unwrap_err();
    match err {
        RepoError::Db(db_err) => {
            assert!(db_err.is_busy(), "unexpected error: {db_err}");
            assert!(matches!(db_err, DbError::Busy(_)));
            assert!(db_err.to_string().contains("locked by another connection"));
        }
        other => panic!("unexpected error: {other}"),
    }

    holder.execute_batch("ROLLBACK;").unwrap();
    repo.upsert_memory(&NewMemory::new("k", "v")).unwrap();
}

#[test]
fn list_rejects_zero_limit() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemoryRepository::new(&conn);

    let err = repo
        .list_memories(&MemoryListQuery::with_limit(0))
        .unwrap_err();
    assert!(matches!(err, RepoError::InvalidQuery(_)));
}

#[test]
fn delete_reports_removed_count() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemoryRepository::new(&conn);

    repo.upsert_memory(&NewMemory::new("k", "v")).unwrap();
    repo.upsert_memory(&NewMemory::new("other", "v")).unwrap();

    assert_eq!(repo.delete_memory("k").unwrap(), 1);
    assert!(repo.get_memory("k").unwrap().is_none());
    assert_eq!(repo.delete_memory("k").unwrap(), 0);
    assert!(repo.get_memory("other").unwrap().is_some());
}

#[test]
fn rows_with_null_timestamps_are_reported_as_invalid_data() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemoryRepository::new(&conn);

    conn.execute_batch(
        "DROP TABLE memories;
         CREATE TABLE memories (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            metadata TEXT,
            created_at TIMESTAMP,
            updated_at TIMESTAMP
         );
         INSERT INTO memories (key, value) VALUES ('broken', 'v');",
    )
    .unwrap();

    let err = repo.get_memory("broken").unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));

    let repaired = repo.upsert_memory(&NewMemory::new("broken", "v2")).unwrap();
    assert_eq!(repaired.created_at, repaired.updated_at);
}
