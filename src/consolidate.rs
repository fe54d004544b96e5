use anyhow::Result;
use chrono::NaiveDate;
use tracing::{error, info};

use crate::model::TableOutcome;
use crate::naming;
use crate::planner::{ReportKind, ReportingPeriod, WeekNumbering};
use crate::store::Store;
use crate::weeks;

/// Consolidate one planned period for a set of base names.
///
/// Failures are isolated per base name: a store error for one base is
/// recorded and logged, and the remaining bases still run. The returned
/// outcomes follow the input base-name order.
pub fn consolidate_period(
  store: &Store,
  period: &ReportingPeriod,
  base_names: &[String],
) -> Result<Vec<TableOutcome>> {
  let mut outcomes = Vec::with_capacity(base_names.len());

  for base in base_names {
    outcomes.push(consolidate_base(store, period, base));
  }

  Ok(outcomes)
}

fn consolidate_base(store: &Store, period: &ReportingPeriod, base: &str) -> TableOutcome {
  let sources = match existing_sources(store, period, base) {
    Ok(sources) => sources,
    Err(e) => return fail(base, 0, e),
  };

  if sources.is_empty() {
    info!(base, prefix = %period.name_prefix, "no source tables in period; skipping");
    return TableOutcome::skipped(base.to_string());
  }

  let select_sql = union_select(period, &sources);
  let table = naming::report_table_name(&period.name_prefix, base, period.dates[0]);

  match store.replace_table_as_select(&table, &select_sql) {
    Ok(()) => match store.row_count(&table) {
      Ok(rows) => TableOutcome::created(base.to_string(), table, sources.len(), rows),
      Err(e) => fail(base, sources.len(), e),
    },
    Err(e) => fail(base, sources.len(), e),
  }
}

fn fail(base: &str, source_tables: usize, e: anyhow::Error) -> TableOutcome {
  error!(base, error = %format!("{e:#}"), "consolidation failed");
  TableOutcome::failed(base.to_string(), source_tables, format!("{e:#}"))
}

/// Probe the store for the period's per-day tables, keeping period order
/// (most-recent-first). Dates with no table are simply left out.
fn existing_sources(
  store: &Store,
  period: &ReportingPeriod,
  base: &str,
) -> Result<Vec<(NaiveDate, String)>> {
  naming::validate_identifier(base)?;

  let mut sources = Vec::new();
  for date in &period.dates {
    let name = naming::source_table_name(base, *date);
    if store.table_exists(&name)? {
      sources.push((*date, name));
    }
  }
  Ok(sources)
}

/// UNION ALL over the selected source tables. Monthly periods tag each
/// source with its week label as an extra `Week` column.
fn union_select(period: &ReportingPeriod, sources: &[(NaiveDate, String)]) -> String {
  let sequential = match period.week_numbering {
    WeekNumbering::Sequential => Some(crate::planner::sequential_week_numbers(&period.dates)),
    WeekNumbering::Automatic => None,
  };

  let selects: Vec<String> = sources
    .iter()
    .map(|(date, name)| {
      let quoted = naming::quote_identifier(name);
      if period.kind == ReportKind::Monthly {
        let week = match &sequential {
          Some(map) => map[date].clone(),
          None => weeks::resolve_week(*date).to_string(),
        };
        format!("SELECT *, '{week}' AS \"Week\" FROM {quoted}")
      } else {
        format!("SELECT * FROM {quoted}")
      }
    })
    .collect();

  selects.join(" UNION ALL ")
}
