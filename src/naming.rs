use anyhow::{bail, Result};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

// Every identifier that reaches the store passes through here. Table names
// are assembled from validated parts, never from raw user input.

static IDENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());
static DATED_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)_(\d{8})$").unwrap());

const MAX_IDENT_LEN: usize = 128;

/// Validate a table name or base name for use in SQL.
pub fn validate_identifier(name: &str) -> Result<&str> {
  if name.is_empty() || name.len() > MAX_IDENT_LEN {
    bail!("invalid identifier length: {:?}", name);
  }
  if !IDENT_RE.is_match(name) {
    bail!("invalid identifier: {:?}", name);
  }
  Ok(name)
}

/// Double-quote a previously validated identifier for embedding in SQL.
pub fn quote_identifier(name: &str) -> String {
  format!("\"{name}\"")
}

/// The `YYYYMMDD` suffix used by per-day source tables and report tables.
pub fn date_suffix(date: NaiveDate) -> String {
  date.format("%Y%m%d").to_string()
}

/// Name of the per-day source table for a base name and date.
pub fn source_table_name(base_name: &str, date: NaiveDate) -> String {
  format!("{}_{}", base_name, date_suffix(date))
}

/// Name of a consolidated report table: prefix + base + anchor date.
pub fn report_table_name(prefix: &str, base_name: &str, anchor: NaiveDate) -> String {
  format!("{}{}_{}", prefix, base_name, date_suffix(anchor))
}

/// Split `<base>_<YYYYMMDD>` into its parts; `None` for undated names.
pub fn split_dated_table(name: &str) -> Option<(&str, NaiveDate)> {
  let caps = DATED_RE.captures(name)?;
  let base = caps.get(1).unwrap().as_str();
  let date = NaiveDate::parse_from_str(caps.get(2).unwrap().as_str(), "%Y%m%d").ok()?;
  Some((base, date))
}
