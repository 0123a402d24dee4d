use notecards_core::db::migrations::{apply_migrations, latest_version, schema_version};
use notecards_core::db::{open_db, open_db_in_memory, table_exists, DbError};
use notecards_core::{DurableMirror, SqliteMirror};
use rusqlite::Connection;
use std::time::{SystemTime, UNIX_EPOCH};

fn slot_columns(conn: &Connection) -> Vec<String> {
    let mut stmt = conn.prepare("PRAGMA table_info(slots);").unwrap();
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    columns
}

fn slot_row(conn: &Connection, key: &str) -> (String, i64) {
    conn.query_row(
        "SELECT value, updated_at FROM slots WHERE key = ?1;",
        [key],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )
    .unwrap()
}

fn epoch_ms() -> i64 {
    let elapsed = SystemTime::now().duration_since(UNIX_EPOCH).unwrap();
    i64::try_from(elapsed.as_millis()).unwrap()
}

#[test]
fn fresh_database_gets_the_slot_table() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn).unwrap(), latest_version());
    assert!(table_exists(&conn, "slots").unwrap());
    assert_eq!(slot_columns(&conn), vec!["key", "value", "updated_at"]);
}

#[test]
fn migrating_a_current_database_applies_nothing() {
    let mut conn = open_db_in_memory().unwrap();
    assert_eq!(apply_migrations(&mut conn).unwrap(), 0);

    let mut blank = Connection::open_in_memory().unwrap();
    assert_eq!(apply_migrations(&mut blank).unwrap(), latest_version() as usize);
    assert!(table_exists(&blank, "slots").unwrap());
}

#[test]
fn slot_rows_survive_reopening_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notecards.db");

    let mut mirror = SqliteMirror::open(&path, "notes").unwrap();
    mirror.write_slot("[]").unwrap();
    drop(mirror);

    let conn = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn).unwrap(), latest_version());
    assert_eq!(slot_row(&conn, "notes").0, "[]");
}

#[test]
fn upsert_keeps_one_row_and_stamps_updated_at() {
    let mut mirror = SqliteMirror::open_in_memory("notes").unwrap();
    let before = epoch_ms();

    mirror.write_slot("[\"first\"]").unwrap();
    let (_, first_stamp) = slot_row(mirror.connection(), "notes");
    assert!(first_stamp >= before, "updated_at {first_stamp} < {before}");

    mirror.write_slot("[\"second\"]").unwrap();
    let (value, second_stamp) = slot_row(mirror.connection(), "notes");
    assert_eq!(value, "[\"second\"]");
    assert!(second_stamp >= first_stamp);
    assert!(second_stamp <= epoch_ms());

    let rows: i64 = mirror
        .connection()
        .query_row("SELECT COUNT(*) FROM slots;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 1);
}

#[test]
fn slot_key_is_unique_outside_the_upsert_path() {
    let conn = open_db_in_memory().unwrap();
    let insert = "INSERT INTO slots (key, value, updated_at) VALUES ('notes', '[]', 0);";
    conn.execute(insert, []).unwrap();
    assert!(conn.execute(insert, []).is_err());
}

#[test]
fn newer_schema_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.pragma_update(None, "user_version", 999).unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::SchemaTooNew { found, supported } => {
            assert_eq!(found, 999);
            assert_eq!(supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(SqliteMirror::open(&path, "notes").is_err());
}
