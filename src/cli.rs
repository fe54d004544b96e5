use anyhow::{bail, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::naming;
use crate::planner::{ReportKind, WeekNumbering};

#[derive(Parser, Debug)]
#[command(
    name = "log-report-builder",
    version,
    about = "Consolidate per-day log tables into daily/weekly/monthly report tables",
    long_about = None
)]
pub struct Cli {
  /// Path to the SQLite database holding the per-day source tables
  #[arg(long, required_unless_present = "gen_man")]
  pub db: Option<PathBuf>,

  /// Base name to consolidate (repeatable); default: discover from the store
  #[arg(long = "base-name")]
  pub base_names: Vec<String>,

  /// Prefix that discovered base names must carry
  #[arg(long, default_value = "T_")]
  pub source_prefix: String,

  /// Report kinds to run (repeatable); default: all three, in fixed order
  #[arg(long = "kind", value_enum)]
  pub kinds: Vec<ReportKind>,

  /// How monthly rows are tagged with a week number
  #[arg(long, value_enum, default_value_t = WeekNumbering::Automatic)]
  pub week_numbering: WeekNumbering,

  /// Plan periods and print the summary without touching the store
  #[arg(long)]
  pub dry_run: bool,

  /// Emit a troff man page to stdout (internal; for packaging)
  #[arg(long, hide = true)]
  pub gen_man: bool,

  /// Override "now" for period planning (hidden; tests only)
  #[arg(long = "now-override", hide = true)]
  pub now_override: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EffectiveConfig {
  pub db: String,
  pub base_names: Vec<String>,
  pub kinds: Vec<ReportKind>,
  pub week_numbering: WeekNumbering,
  pub source_prefix: String,
  pub dry_run: bool,
  pub now_override: Option<String>,
}

pub fn normalize(cli: Cli) -> Result<EffectiveConfig> {
  // `--db` is only optional so that `--gen-man` can run standalone; by the
  // time a real run reaches here it must be present.
  let db = match cli.db {
    Some(db) => db.to_string_lossy().to_string(),
    None => bail!("--db is required"),
  };

  // Base names and the discovery prefix end up inside SQL; reject anything
  // that is not a plain identifier before the store sees it.
  for base in &cli.base_names {
    naming::validate_identifier(base)?;
  }
  if cli.source_prefix.is_empty() {
    bail!("--source-prefix must not be empty");
  }
  naming::validate_identifier(cli.source_prefix.trim_end_matches('_'))?;

  // Dedupe kinds; execution order is fixed by the runner regardless of
  // flag order.
  let kinds = if cli.kinds.is_empty() {
    ReportKind::ALL.to_vec()
  } else {
    let mut kinds: Vec<ReportKind> = Vec::new();
    for kind in ReportKind::ALL {
      if cli.kinds.contains(&kind) {
        kinds.push(kind);
      }
    }
    kinds
  };

  Ok(EffectiveConfig {
    db,
    base_names: cli.base_names,
    kinds,
    week_numbering: cli.week_numbering,
    source_prefix: cli.source_prefix,
    dry_run: cli.dry_run,
    now_override: cli.now_override,
  })
}
