use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

// Calendar week-partitioning lives here to keep the planner focused.
//
// A month is partitioned into "week buckets": contiguous runs of days
// bounded by Sundays (or the month's edges). The leading partial run is
// labeled W0 when the month opens on Friday, Saturday or Sunday.

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Serialize, Deserialize)]
pub enum WeekLabel {
  W0,
  W1,
  W2,
  W3,
  W4,
  W5,
}

impl WeekLabel {
  fn from_index(i: u32) -> WeekLabel {
    match i {
      0 => WeekLabel::W0,
      1 => WeekLabel::W1,
      2 => WeekLabel::W2,
      3 => WeekLabel::W3,
      4 => WeekLabel::W4,
      _ => WeekLabel::W5,
    }
  }
}

impl std::fmt::Display for WeekLabel {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let n = *self as u8;
    write!(f, "W{n}")
  }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WeekBucket {
  pub label: WeekLabel,
  pub days: Vec<u32>,
}

pub fn last_day_of_month(year: i32, month: u32) -> u32 {
  // Advance to first day of next month, subtract one day
  let (ny, nm) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
  let first_next = NaiveDate::from_ymd_opt(ny, nm, 1).unwrap();
  first_next.pred_opt().unwrap().day()
}

/// Partition a month into ordered week buckets.
///
/// Buckets close on Sundays and at the end of the month. The union of all
/// bucket days is exactly `1..=last_day_of_month`, with no overlaps. At
/// most one `W0` bucket exists; when present it is first and shorter than
/// a full week.
pub fn partition_month(year: i32, month: u32) -> Vec<WeekBucket> {
  let last = last_day_of_month(year, month);
  let opener = NaiveDate::from_ymd_opt(year, month, 1).unwrap().weekday();
  let mut index: u32 = match opener {
    Weekday::Fri | Weekday::Sat | Weekday::Sun => 0,
    _ => 1,
  };

  let mut buckets: Vec<WeekBucket> = Vec::new();
  let mut days: Vec<u32> = Vec::new();

  for day in 1..=last {
    days.push(day);
    let weekday = NaiveDate::from_ymd_opt(year, month, day).unwrap().weekday();
    if weekday == Weekday::Sun || day == last {
      buckets.push(WeekBucket {
        label: WeekLabel::from_index(index),
        days: std::mem::take(&mut days),
      });
      index += 1;
    }
  }

  buckets
}

fn bucket_for_day(buckets: &[WeekBucket], day: u32) -> &WeekBucket {
  // Partition invariant: every day of the month is in exactly one bucket.
  buckets.iter().find(|b| b.days.contains(&day)).unwrap()
}

fn last_day_of_previous_month(date: NaiveDate) -> NaiveDate {
  date.with_day(1).unwrap().pred_opt().unwrap()
}

/// Resolve a date to its reporting-week label.
///
/// Dates in a month's leading `W0` bucket belong to the previous month's
/// trailing week and take that month's final bucket label. The rollover is
/// one level only: a month's last bucket is never `W0`, so no recursion.
/// Dates in a short trailing bucket (under 4 days) are relabeled `W1`;
/// downstream consumers depend on that exact behavior.
pub fn resolve_week(date: NaiveDate) -> WeekLabel {
  let buckets = partition_month(date.year(), date.month());
  let bucket = bucket_for_day(&buckets, date.day());

  if bucket.label == WeekLabel::W0 {
    let prev = last_day_of_previous_month(date);
    let prev_buckets = partition_month(prev.year(), prev.month());
    return prev_buckets.last().unwrap().label;
  }

  if bucket.days.len() < 4 {
    return WeekLabel::W1;
  }

  bucket.label
}

/// Whether `date` falls in the final reporting week of its month.
///
/// True for dates in a `W0` bucket (the previous month just closed), for
/// resolved `W5`, and for resolved `W4` when the month has no real `W5`
/// bucket. A `W5` bucket shorter than 4 days never counts as a real
/// trailing week.
pub fn is_final_reporting_week(date: NaiveDate) -> bool {
  let buckets = partition_month(date.year(), date.month());
  let bucket = bucket_for_day(&buckets, date.day());

  if bucket.label == WeekLabel::W0 {
    return true;
  }

  let has_real_w5 = buckets
    .iter()
    .any(|b| b.label == WeekLabel::W5 && b.days.len() >= 4);

  match resolve_week(date) {
    WeekLabel::W5 => true,
    WeekLabel::W4 => !has_real_w5,
    _ => false,
  }
}

/// Locate the first day of the reporting month that `reference` closes.
///
/// A `W0` reference rolls back to the previous month first. The start is
/// the first day of that month's `W1` bucket, extended backward so the
/// opening week always spans a conceptual 7 days; the result may land in
/// the month before.
pub fn period_start(reference: NaiveDate) -> NaiveDate {
  let mut anchor = reference;
  let mut buckets = partition_month(anchor.year(), anchor.month());

  if bucket_for_day(&buckets, anchor.day()).label == WeekLabel::W0 {
    anchor = last_day_of_previous_month(anchor);
    buckets = partition_month(anchor.year(), anchor.month());
  }

  let w1 = buckets.iter().find(|b| b.label == WeekLabel::W1).unwrap();
  let first = NaiveDate::from_ymd_opt(anchor.year(), anchor.month(), w1.days[0]).unwrap();

  if w1.days.len() < 7 {
    first - Duration::days((7 - w1.days.len()) as i64)
  } else {
    first
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
  }

  #[test]
  fn july_2025_partitions_without_w0() {
    // July 1 2025 is a Tuesday; Sundays fall on 6, 13, 20, 27.
    let buckets = partition_month(2025, 7);
    let labels: Vec<WeekLabel> = buckets.iter().map(|b| b.label).collect();
    assert_eq!(
      labels,
      vec![WeekLabel::W1, WeekLabel::W2, WeekLabel::W3, WeekLabel::W4, WeekLabel::W5]
    );
    assert_eq!(buckets[0].days, vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(buckets[4].days, vec![28, 29, 30, 31]);
  }

  #[test]
  fn august_2025_opens_with_w0() {
    // August 1 2025 is a Friday.
    let buckets = partition_month(2025, 8);
    assert_eq!(buckets[0].label, WeekLabel::W0);
    assert_eq!(buckets[0].days, vec![1, 2, 3]);
    assert_eq!(buckets[1].label, WeekLabel::W1);
    assert_eq!(buckets[1].days, vec![4, 5, 6, 7, 8, 9, 10]);
    assert_eq!(buckets.last().unwrap().label, WeekLabel::W4);
    assert_eq!(buckets.last().unwrap().days, vec![25, 26, 27, 28, 29, 30, 31]);
  }

  #[test]
  fn w0_date_rolls_over_to_previous_month_final_label() {
    // Aug 2 2025 sits in W0; July 2025 closed with a 4-day W5.
    assert_eq!(resolve_week(d(2025, 8, 2)), WeekLabel::W5);
  }

  #[test]
  fn w0_rollover_can_land_on_w4() {
    // Mar 1 2026 is a Sunday (W0); Feb 2026 closed with W4 (days 23-28).
    let feb = partition_month(2026, 2);
    assert_eq!(feb.last().unwrap().label, WeekLabel::W4);
    assert_eq!(resolve_week(d(2026, 3, 1)), WeekLabel::W4);
  }

  #[test]
  fn rollover_is_single_level() {
    // A month's last bucket is never W0, so one hop always terminates.
    for ym in [(2025, 1), (2025, 8), (2026, 2), (2026, 3), (2024, 12)] {
      let buckets = partition_month(ym.0, ym.1);
      assert_ne!(buckets.last().unwrap().label, WeekLabel::W0);
    }
  }

  #[test]
  fn short_trailing_bucket_relabels_to_w1() {
    // Sep 2025 ends with a 2-day bucket (29-30) labeled W5.
    let buckets = partition_month(2025, 9);
    assert_eq!(buckets.last().unwrap().days, vec![29, 30]);
    assert_eq!(buckets.last().unwrap().label, WeekLabel::W5);
    assert_eq!(resolve_week(d(2025, 9, 29)), WeekLabel::W1);
    assert_eq!(resolve_week(d(2025, 9, 30)), WeekLabel::W1);
  }

  #[test]
  fn ordinary_mid_month_date_keeps_its_label() {
    assert_eq!(resolve_week(d(2025, 7, 16)), WeekLabel::W3);
    assert_eq!(resolve_week(d(2025, 8, 5)), WeekLabel::W1);
  }

  #[test]
  fn final_week_true_for_real_w5() {
    assert!(is_final_reporting_week(d(2025, 7, 30)));
  }

  #[test]
  fn final_week_discounts_degenerate_w5() {
    // Sep 2025: W5 has 2 days, so the W4 bucket (22-28) closes the month.
    assert!(is_final_reporting_week(d(2025, 9, 27)));
    assert!(!is_final_reporting_week(d(2025, 9, 29)));
  }

  #[test]
  fn final_week_false_for_w4_when_real_w5_exists() {
    assert!(!is_final_reporting_week(d(2025, 7, 25)));
  }

  #[test]
  fn final_week_true_inside_w0() {
    assert!(is_final_reporting_week(d(2025, 8, 1)));
    assert!(is_final_reporting_week(d(2026, 3, 1)));
  }

  #[test]
  fn period_start_plain_month() {
    // Aug 2025: W1 spans 4-10, a full week.
    assert_eq!(period_start(d(2025, 8, 31)), d(2025, 8, 4));
  }

  #[test]
  fn period_start_extends_short_opening_week_into_prior_month() {
    // July 2025 W1 is 6 days (1-6), so the start backs up to June 30.
    assert_eq!(period_start(d(2025, 7, 30)), d(2025, 6, 30));
  }

  #[test]
  fn period_start_rolls_w0_reference_back_a_month() {
    // Aug 3 2025 is W0; the period being closed is July's.
    assert_eq!(period_start(d(2025, 8, 3)), d(2025, 6, 30));
  }

  #[test]
  fn last_day_of_month_handles_leap_years() {
    assert_eq!(last_day_of_month(2024, 2), 29);
    assert_eq!(last_day_of_month(2025, 2), 28);
    assert_eq!(last_day_of_month(2025, 12), 31);
  }

  #[test]
  fn week_label_displays_bare_w_number() {
    assert_eq!(WeekLabel::W0.to_string(), "W0");
    assert_eq!(WeekLabel::W4.to_string(), "W4");
  }
}
