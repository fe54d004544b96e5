use std::path::PathBuf;

use rusqlite::Connection;

/// Create a fixture database with per-day source tables around the end of
/// August 2025 (Sunday Aug 31 closes both the week and the month), plus a
/// differently-prefixed table that discovery must ignore.
#[allow(dead_code)]
pub fn init_fixture_db() -> (tempfile::TempDir, PathBuf) {
  let dir = tempfile::TempDir::new().unwrap();
  let path = dir.path().join("logs.db");
  let conn = Connection::open(&path).unwrap();

  conn
    .execute_batch(
      "CREATE TABLE T_ALERTS_20250829 (id INTEGER, severity TEXT);
       CREATE TABLE T_ALERTS_20250830 (id INTEGER, severity TEXT);
       CREATE TABLE T_ALERTS_20250831 (id INTEGER, severity TEXT);
       CREATE TABLE T_FLOWS_20250831 (id INTEGER, bytes INTEGER);
       CREATE TABLE SCRATCH_20250831 (id INTEGER);
       INSERT INTO T_ALERTS_20250829 VALUES (1, 'low');
       INSERT INTO T_ALERTS_20250830 VALUES (2, 'high'), (3, 'low');
       INSERT INTO T_ALERTS_20250831 VALUES (4, 'high');
       INSERT INTO T_FLOWS_20250831 VALUES (1, 4096);",
    )
    .unwrap();

  (dir, path)
}

#[allow(dead_code)]
pub fn table_names(path: &PathBuf) -> Vec<String> {
  let conn = Connection::open(path).unwrap();
  let mut stmt = conn
    .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
    .unwrap();
  let names = stmt
    .query_map([], |row| row.get::<_, String>(0))
    .unwrap()
    .collect::<Result<Vec<_>, _>>()
    .unwrap();
  names
}

#[allow(dead_code)]
pub fn count_rows(path: &PathBuf, table: &str) -> i64 {
  let conn = Connection::open(path).unwrap();
  conn
    .query_row(&format!("SELECT COUNT(*) FROM \"{table}\""), [], |row| row.get(0))
    .unwrap()
}
