use std::path::Path;

use anyhow::{bail, Context, Result};
use rusqlite::Connection;
use tracing::{debug, info};

use crate::naming;

const LOCK_TABLE_DDL: &str = "CREATE TABLE IF NOT EXISTS _run_lock (
  name TEXT PRIMARY KEY,
  acquired_at TEXT NOT NULL DEFAULT (datetime('now'))
);";

// A run finishes in minutes; a lock row older than this was left behind by
// a crashed run and may be reclaimed.
const STALE_LOCK_CUTOFF: &str = "-1 day";

/// Thin wrapper over one SQLite connection, opened per run and released
/// when dropped. Every table-level operation commits or fails as a unit.
pub struct Store {
  conn: Connection,
}

impl Store {
  pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
    let path = path.as_ref();
    let conn = Connection::open(path)
      .with_context(|| format!("opening database at {}", path.display()))?;
    debug!(path = %path.display(), "store opened");
    Ok(Store { conn })
  }

  #[cfg(test)]
  pub fn open_in_memory() -> Result<Self> {
    Ok(Store {
      conn: Connection::open_in_memory()?,
    })
  }

  #[cfg(test)]
  pub fn execute_batch_for_tests(&self, sql: &str) -> Result<()> {
    self.conn.execute_batch(sql).map_err(Into::into)
  }

  #[cfg(test)]
  pub fn query_strings_for_tests(&self, sql: &str) -> Result<Vec<String>> {
    let mut stmt = self.conn.prepare(sql)?;
    let values = stmt
      .query_map([], |row| row.get::<_, String>(0))?
      .collect::<Result<Vec<_>, _>>()?;
    Ok(values)
  }

  /// All table names in the store, sorted.
  pub fn list_tables(&self) -> Result<Vec<String>> {
    let mut stmt = self
      .conn
      .prepare_cached("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")?;
    let names = stmt
      .query_map([], |row| row.get::<_, String>(0))?
      .collect::<Result<Vec<_>, _>>()?;
    Ok(names)
  }

  pub fn table_exists(&self, name: &str) -> Result<bool> {
    let mut stmt = self
      .conn
      .prepare_cached("SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1")?;
    match stmt.query_row([name], |_| Ok(())) {
      Ok(()) => Ok(true),
      Err(rusqlite::Error::QueryReturnedNoRows) => Ok(false),
      Err(e) => Err(e.into()),
    }
  }

  pub fn row_count(&self, name: &str) -> Result<i64> {
    naming::validate_identifier(name)?;
    let sql = format!("SELECT COUNT(*) FROM {}", naming::quote_identifier(name));
    let count = self.conn.query_row(&sql, [], |row| row.get(0))?;
    Ok(count)
  }

  /// Materialize `name` from a SELECT, atomically replacing any existing
  /// table of that name. Drop and create run inside one transaction, so a
  /// failed creation leaves a previous table intact.
  pub fn replace_table_as_select(&self, name: &str, select_sql: &str) -> Result<()> {
    naming::validate_identifier(name)?;
    let quoted = naming::quote_identifier(name);

    let tx = self
      .conn
      .unchecked_transaction()
      .context("starting replace transaction")?;
    tx.execute_batch(&format!("DROP TABLE IF EXISTS {quoted};"))
      .with_context(|| format!("dropping previous {name}"))?;
    tx.execute_batch(&format!("CREATE TABLE {quoted} AS {select_sql};"))
      .with_context(|| format!("creating {name}"))?;
    tx.commit().with_context(|| format!("committing {name}"))?;

    info!(table = name, "created report table");
    Ok(())
  }

  /// Take the named run lock, failing fast when another invocation holds
  /// it. The returned guard releases the lock on drop, including on error
  /// paths.
  pub fn acquire_run_lock(&self, name: &str) -> Result<RunLock<'_>> {
    self.conn.execute_batch(LOCK_TABLE_DDL)?;

    let reclaimed = self.conn.execute(
      &format!(
        "DELETE FROM _run_lock WHERE name = ?1 AND acquired_at < datetime('now', '{STALE_LOCK_CUTOFF}')"
      ),
      [name],
    )?;
    if reclaimed > 0 {
      tracing::warn!(lock = name, "reclaimed stale run lock from a crashed run");
    }

    let inserted = self
      .conn
      .execute("INSERT OR IGNORE INTO _run_lock (name) VALUES (?1)", [name])?;
    if inserted == 0 {
      bail!("another run holds the lock {name:?}; refusing to overlap");
    }

    debug!(lock = name, "run lock acquired");
    Ok(RunLock {
      conn: &self.conn,
      name: name.to_string(),
    })
  }
}

pub struct RunLock<'a> {
  conn: &'a Connection,
  name: String,
}

impl Drop for RunLock<'_> {
  fn drop(&mut self) {
    if let Err(e) = self
      .conn
      .execute("DELETE FROM _run_lock WHERE name = ?1", [self.name.as_str()])
    {
      tracing::warn!(lock = %self.name, error = %e, "failed to release run lock");
    }
  }
}
