use std::collections::BTreeSet;

use anyhow::Result;
use chrono::NaiveDate;
use tracing::info;

use crate::cli::EffectiveConfig;
use crate::consolidate;
use crate::model::{DateRange, PeriodReport, RunSummary};
use crate::naming;
use crate::planner::{self, ReportKind};
use crate::store::Store;

const RUN_LOCK_NAME: &str = "consolidation";

/// Execute one scheduled run: Daily, then Weekly, then Monthly, each fully
/// completing (or failing) before the next. The run lock is held for the
/// whole run and released on any exit path.
pub fn process_run(cfg: &EffectiveConfig, store: &Store, now: NaiveDate) -> Result<RunSummary> {
  // A dry run must leave the store byte-identical, so it skips the lock
  // entirely (taking it would create the lock table).
  let lock = if cfg.dry_run {
    None
  } else {
    Some(store.acquire_run_lock(RUN_LOCK_NAME)?)
  };

  let base_names = if cfg.base_names.is_empty() {
    discover_base_names(store, &cfg.source_prefix)?
  } else {
    cfg.base_names.clone()
  };
  info!(count = base_names.len(), "base names for this run");

  let mut periods: Vec<PeriodReport> = Vec::new();

  for kind in ReportKind::ALL {
    if !cfg.kinds.contains(&kind) {
      continue;
    }
    periods.push(run_period(cfg, store, now, kind, &base_names)?);
  }

  drop(lock);

  Ok(RunSummary {
    run_date: now.format("%Y-%m-%d").to_string(),
    week_numbering: cfg.week_numbering,
    dry_run: cfg.dry_run,
    periods,
  })
}

fn run_period(
  cfg: &EffectiveConfig,
  store: &Store,
  now: NaiveDate,
  kind: ReportKind,
  base_names: &[String],
) -> Result<PeriodReport> {
  let period = match planner::plan(now, kind, cfg.week_numbering) {
    Some(period) => period,
    None => {
      info!(?kind, "not scheduled this run");
      return Ok(PeriodReport {
        kind,
        fired: false,
        name_prefix: None,
        date_range: None,
        tables: Vec::new(),
      });
    }
  };

  info!(
    ?kind,
    prefix = %period.name_prefix,
    days = period.dates.len(),
    "period fires"
  );

  let date_range = Some(DateRange {
    from: period.dates.last().unwrap().format("%Y-%m-%d").to_string(),
    to: period.dates[0].format("%Y-%m-%d").to_string(),
  });

  let tables = if cfg.dry_run {
    Vec::new()
  } else {
    consolidate::consolidate_period(store, &period, base_names)?
  };

  Ok(PeriodReport {
    kind,
    fired: true,
    name_prefix: Some(period.name_prefix),
    date_range,
    tables,
  })
}

/// Derive base names from the store: dated tables `<base>_<YYYYMMDD>`
/// whose base starts with the source prefix, deduped and sorted.
pub fn discover_base_names(store: &Store, source_prefix: &str) -> Result<Vec<String>> {
  let mut bases: BTreeSet<String> = BTreeSet::new();

  for table in store.list_tables()? {
    if let Some((base, _date)) = naming::split_dated_table(&table) {
      if base.starts_with(source_prefix) {
        bases.insert(base.to_string());
      }
    }
  }

  Ok(bases.into_iter().collect())
}
