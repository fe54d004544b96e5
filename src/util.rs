use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::CommandFactory;

/// Parse a `--now-override` date (`YYYY-MM-DD`). Bad input is an error
/// rather than a silent fallback to the wall clock.
pub fn parse_now_override(s: Option<&str>) -> Result<Option<NaiveDate>> {
  s.map(|raw| {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").with_context(|| format!("parsing --now-override {raw:?}"))
  })
  .transpose()
}

/// Returns the effective "now" given an optional override.
///
/// Centralizes test determinism without sprinkling `Local::now()` through
/// the planner.
pub fn effective_now(override_now: Option<NaiveDate>) -> NaiveDate {
  override_now.unwrap_or_else(|| Local::now().date_naive())
}

/// Render a section-1 man page for a clap `CommandFactory` implementor.
/// Returns the troff content as a UTF-8 string.
pub fn render_man_page<T: CommandFactory>() -> Result<String> {
  let cmd = T::command();
  let man = clap_mangen::Man::new(cmd);
  let mut buf: Vec<u8> = Vec::new();

  man.render(&mut buf)?;

  Ok(String::from_utf8_lossy(&buf).to_string())
}
