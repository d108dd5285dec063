//! Date-Range Resolution
//!
//! Pure keyword/ISO parser producing an inclusive `{start, end, label}` range
//! anchored at a caller-supplied reference instant. Day boundaries are local
//! midnight to 23:59:59.999. Unrecognized input never fails: it falls back to
//! "today" and flags the original expression in the label so both logs and
//! the model can see the fallback happened.

use std::sync::LazyLock;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use regex::Regex;
use serde::{Deserialize, Serialize};

static LAST_DAYS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^last\s+(\d{1,4})\s+days?$").expect("Invalid regex"));

static LAST_HOURS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^last\s+(\d{1,4})\s+hours?$").expect("Invalid regex"));

static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{4}-\d{2}-\d{2}").expect("Invalid regex"));

/// An immutable, inclusive date range
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,

    /// Human-readable description; carries the fallback marker when the
    /// input expression was not recognized
    pub label: String,
}

impl DateRange {
    /// Whole days from `start` to `end`, both inclusive
    pub fn from_dates(start: NaiveDate, end: NaiveDate, label: impl Into<String>) -> Self {
        Self {
            start: start.and_time(NaiveTime::MIN),
            end: end.and_time(end_of_day()),
            label: label.into(),
        }
    }

    pub fn contains(&self, instant: NaiveDateTime) -> bool {
        instant >= self.start && instant <= self.end
    }
}

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN)
}

/// Resolve the range for "today" at the reference instant
pub fn today(now: NaiveDateTime) -> DateRange {
    DateRange::from_dates(now.date(), now.date(), "today")
}

/// Resolve a keyword or ISO expression against a reference instant.
///
/// Supported: today, yesterday, this/last week (Monday start), this/last
/// month, this/last weekend (Friday through Sunday, anchored to the most
/// recent Friday on or before `now`), "last N days", "last N hours", a single
/// ISO date, and an ISO pair joined by "to"/"-"/"hasta".
pub fn resolve(expr: &str, now: NaiveDateTime) -> DateRange {
    let normalized = expr.trim().to_lowercase();
    let normalized = normalized.split_whitespace().collect::<Vec<_>>().join(" ");
    let date = now.date();

    match normalized.as_str() {
        "" | "today" | "hoy" => return today(now),
        "yesterday" | "ayer" => {
            let day = date - Duration::days(1);
            return DateRange::from_dates(day, day, "yesterday");
        }
        "this week" => {
            let week = date.week(Weekday::Mon);
            return DateRange::from_dates(week.first_day(), week.last_day(), "this week");
        }
        "last week" => {
            let week = (date - Duration::days(7)).week(Weekday::Mon);
            return DateRange::from_dates(week.first_day(), week.last_day(), "last week");
        }
        "this month" => {
            let (first, last) = month_bounds(date.year(), date.month());
            return DateRange::from_dates(first, last, "this month");
        }
        "last month" => {
            let (year, month) = if date.month() == 1 {
                (date.year() - 1, 12)
            } else {
                (date.year(), date.month() - 1)
            };
            let (first, last) = month_bounds(year, month);
            return DateRange::from_dates(first, last, "last month");
        }
        "this weekend" => {
            let friday = most_recent_friday(date);
            return DateRange::from_dates(friday, friday + Duration::days(2), "this weekend");
        }
        "last weekend" => {
            let friday = most_recent_friday(date) - Duration::days(7);
            return DateRange::from_dates(friday, friday + Duration::days(2), "last weekend");
        }
        _ => {}
    }

    if let Some(caps) = LAST_DAYS.captures(&normalized) {
        if let Ok(days) = caps[1].parse::<i64>() {
            let start = date - Duration::days(days);
            return DateRange::from_dates(start, date, format!("last {} days", days));
        }
    }

    if let Some(caps) = LAST_HOURS.captures(&normalized) {
        if let Ok(hours) = caps[1].parse::<i64>() {
            return DateRange {
                start: now - Duration::hours(hours),
                end: now,
                label: format!("last {} hours", hours),
            };
        }
    }

    // ISO forms: one date, or a pair joined by "to"/"-"/"hasta".
    let dates: Vec<NaiveDate> = ISO_DATE
        .find_iter(&normalized)
        .filter_map(|m| NaiveDate::parse_from_str(m.as_str(), "%Y-%m-%d").ok())
        .collect();

    match dates.as_slice() {
        [single] => {
            return DateRange::from_dates(*single, *single, single.format("%Y-%m-%d").to_string());
        }
        [first, second] => {
            let (start, end) = if first <= second {
                (*first, *second)
            } else {
                (*second, *first)
            };
            let label = format!("{} to {}", start.format("%Y-%m-%d"), end.format("%Y-%m-%d"));
            return DateRange::from_dates(start, end, label);
        }
        _ => {}
    }

    let mut fallback = today(now);
    fallback.label = format!("today (unrecognized range \"{}\")", expr.trim());
    fallback
}

/// Resolve an explicit ISO start/end pair (the tool-parameter form)
pub fn resolve_pair(start: &str, end: &str, now: NaiveDateTime) -> DateRange {
    resolve(&format!("{} to {}", start.trim(), end.trim()), now)
}

/// Most recent Friday on or before the given day, so a mid-week reference
/// points at the past weekend rather than the upcoming one
fn most_recent_friday(date: NaiveDate) -> NaiveDate {
    let days_back =
        (date.weekday().num_days_from_monday() + 7 - Weekday::Fri.num_days_from_monday()) % 7;
    date - Duration::days(i64::from(days_back))
}

fn month_bounds(year: i32, month: u32) -> (NaiveDate, NaiveDate) {
    let first = NaiveDate::from_ymd_opt(year, month, 1).unwrap_or_default();
    let next_first = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .unwrap_or_default();
    (first, next_first - Duration::days(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wednesday() -> NaiveDateTime {
        // Wednesday 2026-02-11, mid-morning
        NaiveDate::from_ymd_opt(2026, 2, 11)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_this_weekend_is_the_past_weekend() {
        let range = resolve("this weekend", wednesday());
        assert_eq!(range.start, date(2026, 2, 6).and_hms_opt(0, 0, 0).unwrap());
        assert_eq!(
            range.end,
            date(2026, 2, 8).and_hms_milli_opt(23, 59, 59, 999).unwrap()
        );
    }

    #[test]
    fn test_weekend_on_a_friday_is_the_current_one() {
        let friday = date(2026, 2, 13).and_hms_opt(9, 0, 0).unwrap();
        let range = resolve("this weekend", friday);
        assert_eq!(range.start.date(), date(2026, 2, 13));
        assert_eq!(range.end.date(), date(2026, 2, 15));
    }

    #[test]
    fn test_last_weekend() {
        let range = resolve("last weekend", wednesday());
        assert_eq!(range.start.date(), date(2026, 1, 30));
        assert_eq!(range.end.date(), date(2026, 2, 1));
    }

    #[test]
    fn test_last_seven_days() {
        let range = resolve("last 7 days", wednesday());
        assert_eq!(range.start, date(2026, 2, 4).and_hms_opt(0, 0, 0).unwrap());
        assert_eq!(
            range.end,
            date(2026, 2, 11).and_hms_milli_opt(23, 59, 59, 999).unwrap()
        );
        assert_eq!(range.label, "last 7 days");
    }

    #[test]
    fn test_last_hours_ends_at_reference_instant() {
        let range = resolve("last 6 hours", wednesday());
        assert_eq!(range.end, wednesday());
        assert_eq!(range.start, wednesday() - Duration::hours(6));
    }

    #[test]
    fn test_weeks_start_monday() {
        let range = resolve("this week", wednesday());
        assert_eq!(range.start.date(), date(2026, 2, 9));
        assert_eq!(range.end.date(), date(2026, 2, 15));

        let last = resolve("last week", wednesday());
        assert_eq!(last.start.date(), date(2026, 2, 2));
        assert_eq!(last.end.date(), date(2026, 2, 8));
    }

    #[test]
    fn test_calendar_months() {
        let range = resolve("last month", wednesday());
        assert_eq!(range.start.date(), date(2026, 1, 1));
        assert_eq!(range.end.date(), date(2026, 1, 31));

        // January rolls back into the previous year.
        let january = date(2026, 1, 15).and_hms_opt(12, 0, 0).unwrap();
        let rolled = resolve("last month", january);
        assert_eq!(rolled.start.date(), date(2025, 12, 1));
        assert_eq!(rolled.end.date(), date(2025, 12, 31));
    }

    #[test]
    fn test_iso_single_and_pairs() {
        let single = resolve("2026-02-03", wednesday());
        assert_eq!(single.start.date(), date(2026, 2, 3));
        assert_eq!(single.end.date(), date(2026, 2, 3));

        for sep in ["to", "-", "hasta"] {
            let expr = format!("2026-02-01 {} 2026-02-28", sep);
            let range = resolve(&expr, wednesday());
            assert_eq!(range.start.date(), date(2026, 2, 1));
            assert_eq!(range.end.date(), date(2026, 2, 28));
            assert_eq!(range.label, "2026-02-01 to 2026-02-28");
        }
    }

    #[test]
    fn test_reversed_pair_is_reordered() {
        let range = resolve("2026-02-28 to 2026-02-01", wednesday());
        assert!(range.start < range.end);
    }

    #[test]
    fn test_unrecognized_falls_back_to_today_with_marker() {
        let range = resolve("the day the invoices exploded", wednesday());
        assert_eq!(range.start.date(), date(2026, 2, 11));
        assert_eq!(range.end.date(), date(2026, 2, 11));
        assert!(range.label.contains("unrecognized"));
        assert!(range.label.contains("the day the invoices exploded"));
    }

    #[test]
    fn test_empty_is_plain_today() {
        let range = resolve("", wednesday());
        assert_eq!(range.label, "today");
    }
}
