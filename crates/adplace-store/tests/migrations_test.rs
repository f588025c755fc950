// Integration tests for the migration runner

use adplace_core::ExErrorKind;
use adplace_store::migrations::{applied_migrations, apply_migrations, get_migrations};
use rusqlite::Connection;

fn setup_test_db() -> Connection {
    Connection::open_in_memory().unwrap()
}

fn table_names(conn: &Connection) -> Vec<String> {
    let mut stmt = conn
        .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
        .unwrap();
    stmt.query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<Vec<String>, _>>()
        .unwrap()
}

fn index_names(conn: &Connection) -> Vec<String> {
    let mut stmt = conn
        .prepare("SELECT name FROM sqlite_master WHERE type = 'index' AND tbl_name = 'ads'")
        .unwrap();
    stmt.query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<Vec<String>, _>>()
        .unwrap()
}

#[test]
fn test_apply_migrations_on_empty_db() {
    let mut conn = setup_test_db();
    apply_migrations(&mut conn).unwrap();

    assert_eq!(table_names(&conn), vec!["ads", "schema_version"]);
    let indexes = index_names(&conn);
    for expected in ["idx_ads_placement", "idx_ads_status", "idx_ads_created_at"] {
        assert!(indexes.iter().any(|i| i == expected), "missing index {}", expected);
    }
}

#[test]
fn test_every_embedded_migration_is_recorded() {
    let mut conn = setup_test_db();
    apply_migrations(&mut conn).unwrap();

    let expected: Vec<String> = get_migrations().iter().map(|m| m.id.to_string()).collect();
    assert_eq!(applied_migrations(&conn).unwrap(), expected);
}

#[test]
fn test_reapply_is_noop() {
    let mut conn = setup_test_db();
    apply_migrations(&mut conn).unwrap();
    conn.execute(
        "INSERT INTO ads (id, title, image_url, placement, created_at) \
         VALUES ('a', 't', 'https://x/a.png', 'homepage', 1)",
        [],
    )
    .unwrap();

    apply_migrations(&mut conn).unwrap();

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM ads", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn test_status_defaults_to_active_and_is_constrained() {
    let mut conn = setup_test_db();
    apply_migrations(&mut conn).unwrap();

    conn.execute(
        "INSERT INTO ads (id, title, image_url, placement, created_at) \
         VALUES ('a', 't', 'https://x/a.png', 'homepage', 1)",
        [],
    )
    .unwrap();
    let status: String = conn
        .query_row("SELECT status FROM ads WHERE id = 'a'", [], |r| r.get(0))
        .unwrap();
    assert_eq!(status, "active");

    let bad = conn.execute(
        "INSERT INTO ads (id, title, image_url, placement, status, created_at) \
         VALUES ('b', 't', 'https://x/a.png', 'homepage', 'paused', 1)",
        [],
    );
    assert!(bad.is_err());
}

#[test]
fn test_tampered_checksum_is_rejected() {
    let mut conn = setup_test_db();
    apply_migrations(&mut conn).unwrap();
    conn.execute(
        "UPDATE schema_version SET checksum = 'deadbeef' WHERE migration_id = '001_create_ads'",
        [],
    )
    .unwrap();

    let err = apply_migrations(&mut conn).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::Storage);
    assert_eq!(err.entity_id(), Some("001_create_ads"));
    assert!(err.message().contains("Checksum mismatch"));
}
