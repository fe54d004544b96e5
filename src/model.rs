use serde::{Deserialize, Serialize};

use crate::planner::{ReportKind, WeekNumbering};

// JSON shapes for the run summary printed on stdout. Field names are part
// of the tool's output contract; additive changes only.

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TableOutcome {
  pub base_name: String,
  /// Created report table, absent when the base was skipped or failed.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub table: Option<String>,
  pub source_tables: usize,
  /// Row count of the created table.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub rows: Option<i64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
}

impl TableOutcome {
  pub fn created(base_name: String, table: String, source_tables: usize, rows: i64) -> Self {
    TableOutcome {
      base_name,
      table: Some(table),
      source_tables,
      rows: Some(rows),
      error: None,
    }
  }

  pub fn skipped(base_name: String) -> Self {
    TableOutcome {
      base_name,
      table: None,
      source_tables: 0,
      rows: None,
      error: None,
    }
  }

  pub fn failed(base_name: String, source_tables: usize, error: String) -> Self {
    TableOutcome {
      base_name,
      table: None,
      source_tables,
      rows: None,
      error: Some(error),
    }
  }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PeriodReport {
  pub kind: ReportKind,
  pub fired: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub name_prefix: Option<String>,
  /// Covered dates, present when the period fired.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub date_range: Option<DateRange>,
  #[serde(skip_serializing_if = "Vec::is_empty", default)]
  pub tables: Vec<TableOutcome>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DateRange {
  pub from: String,
  pub to: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RunSummary {
  /// The `now` the run was planned against, `YYYY-MM-DD`.
  pub run_date: String,
  pub week_numbering: WeekNumbering,
  pub dry_run: bool,
  pub periods: Vec<PeriodReport>,
}

impl RunSummary {
  pub fn failed_tables(&self) -> usize {
    self
      .periods
      .iter()
      .flat_map(|p| p.tables.iter())
      .filter(|t| t.error.is_some())
      .count()
  }

  pub fn created_tables(&self) -> usize {
    self
      .periods
      .iter()
      .flat_map(|p| p.tables.iter())
      .filter(|t| t.table.is_some())
      .count()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn summary_counts_created_and_failed() {
    let summary = RunSummary {
      run_date: "2025-09-01".into(),
      week_numbering: WeekNumbering::Automatic,
      dry_run: false,
      periods: vec![PeriodReport {
        kind: ReportKind::Daily,
        fired: true,
        name_prefix: Some("DAILY_".into()),
        date_range: None,
        tables: vec![
          TableOutcome::created("T_A".into(), "DAILY_T_A_20250831".into(), 2, 10),
          TableOutcome::skipped("T_B".into()),
          TableOutcome::failed("T_C".into(), 1, "boom".into()),
        ],
      }],
    };
    assert_eq!(summary.created_tables(), 1);
    assert_eq!(summary.failed_tables(), 1);
  }

  #[test]
  fn skipped_outcome_serializes_without_optional_fields() {
    let v = serde_json::to_value(TableOutcome::skipped("T_B".into())).unwrap();
    assert!(v.get("table").is_none());
    assert!(v.get("error").is_none());
    assert_eq!(v["source_tables"], 0);
  }
}
