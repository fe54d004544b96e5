use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::weeks;

#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
#[value(rename_all = "lowercase")]
pub enum ReportKind {
  Daily,
  Weekly,
  Monthly,
}

impl ReportKind {
  /// Fixed execution order within one run.
  pub const ALL: [ReportKind; 3] = [ReportKind::Daily, ReportKind::Weekly, ReportKind::Monthly];
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
#[value(rename_all = "lowercase")]
pub enum WeekNumbering {
  /// Label each date with its calendar reporting week.
  Automatic,
  /// Number dates positionally in chronological chunks of 7.
  Sequential,
}

/// One planned batch of consolidation work, consumed immediately by the
/// consolidator. `dates` is most-recent-first; `dates[0]` is the anchor
/// date used in report table names.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReportingPeriod {
  pub kind: ReportKind,
  pub dates: Vec<NaiveDate>,
  pub name_prefix: String,
  pub week_numbering: WeekNumbering,
}

/// Decide whether `kind` fires for a run dated `now`, and with which dates.
///
/// `None` means the period is not scheduled this invocation; that is a
/// skip, not an error. All triggers look at the report date `now - 1`.
pub fn plan(now: NaiveDate, kind: ReportKind, week_numbering: WeekNumbering) -> Option<ReportingPeriod> {
  let report_date = now - Duration::days(1);

  match kind {
    ReportKind::Daily => Some(ReportingPeriod {
      kind,
      dates: preceding_days(now, 3),
      name_prefix: "DAILY_".to_string(),
      week_numbering,
    }),
    ReportKind::Weekly => {
      if report_date.weekday() != Weekday::Sun {
        return None;
      }
      Some(ReportingPeriod {
        kind,
        dates: preceding_days(now, 7),
        name_prefix: format!("{}_", weeks::resolve_week(report_date)),
        week_numbering,
      })
    }
    ReportKind::Monthly => {
      if report_date.weekday() != Weekday::Sun || !weeks::is_final_reporting_week(report_date) {
        return None;
      }
      let start = weeks::period_start(report_date);
      let span = (report_date - start).num_days() + 1;
      Some(ReportingPeriod {
        kind,
        dates: preceding_days(now, span),
        name_prefix: "MONTHLY_".to_string(),
        week_numbering,
      })
    }
  }
}

fn preceding_days(now: NaiveDate, count: i64) -> Vec<NaiveDate> {
  (1..=count).map(|i| now - Duration::days(i)).collect()
}

/// Positional week numbers for a period's dates: sorted chronologically,
/// labeled `W1`, `W2`, … with a boundary every 7th date, independent of
/// calendar weeks. Labels can exceed `W5` for long periods, hence strings.
pub fn sequential_week_numbers(dates: &[NaiveDate]) -> BTreeMap<NaiveDate, String> {
  let mut sorted: Vec<NaiveDate> = dates.to_vec();
  sorted.sort();

  sorted
    .iter()
    .enumerate()
    .map(|(i, date)| (*date, format!("W{}", i / 7 + 1)))
    .collect()
}
