use chrono::{DateTime, Datelike, Days, FixedOffset, Months, NaiveDate};
use serde::Serialize;

use crate::analytics::dates::local_day;
use crate::error::AppError;
use crate::models::order::Order;
use crate::models::user::User;

/// The quick ranges offered by every dashboard plus an explicit custom window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RangeSelection {
    #[default]
    All,
    Today,
    LastNDays { days: u32 },
    CurrentMonth,
    Custom {
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    },
}

impl RangeSelection {
    /// Builds a selection from the `range`/`from`/`to` query values.
    pub fn parse(
        range: Option<&str>,
        from: Option<&str>,
        to: Option<&str>,
    ) -> Result<Self, AppError> {
        let range = range.map(str::trim).unwrap_or("all").to_ascii_lowercase();

        match range.as_str() {
            "" | "all" => Ok(RangeSelection::All),
            "today" => Ok(RangeSelection::Today),
            "current" | "month" => Ok(RangeSelection::CurrentMonth),
            "custom" => Ok(RangeSelection::Custom {
                from: parse_bound("from", from)?,
                to: parse_bound("to", to)?,
            }),
            other => other
                .parse::<u32>()
                .ok()
                .filter(|days| *days > 0)
                .map(|days| RangeSelection::LastNDays { days })
                .ok_or_else(|| AppError::BadRequest(format!("unknown range: {other}"))),
        }
    }

    /// Inclusive calendar-day window, `None` on a side means unbounded.
    pub fn day_bounds(&self, today: NaiveDate) -> (Option<NaiveDate>, Option<NaiveDate>) {
        match self {
            RangeSelection::All => (None, None),
            RangeSelection::Today => (Some(today), Some(today)),
            RangeSelection::LastNDays { days } => {
                let back = u64::from(days.saturating_sub(1));
                (today.checked_sub_days(Days::new(back)), Some(today))
            }
            RangeSelection::CurrentMonth => {
                let first = today.with_day(1);
                let last = first
                    .and_then(|d| d.checked_add_months(Months::new(1)))
                    .and_then(|d| d.pred_opt());
                (first, last)
            }
            RangeSelection::Custom { from, to } => (*from, *to),
        }
    }

    pub fn contains_day(&self, day: NaiveDate, today: NaiveDate) -> bool {
        let (start, end) = self.day_bounds(today);
        start.is_none_or(|s| day >= s) && end.is_none_or(|e| day <= e)
    }
}

fn parse_bound(name: &str, raw: Option<&str>) -> Result<Option<NaiveDate>, AppError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(Some)
            .map_err(|err| AppError::BadRequest(format!("invalid {name} date {value}: {err}"))),
    }
}

/// Records that carry the timestamp range filters apply to.
pub trait Dated {
    fn record_date(&self) -> Option<&str>;
}

impl Dated for Order {
    fn record_date(&self) -> Option<&str> {
        self.created_at.as_deref()
    }
}

impl Dated for User {
    fn record_date(&self) -> Option<&str> {
        self.created_at.as_deref()
    }
}

impl<T: Dated + ?Sized> Dated for &T {
    fn record_date(&self) -> Option<&str> {
        (**self).record_date()
    }
}

pub fn filter_by_range<'a, T: Dated>(
    records: &'a [T],
    range: &RangeSelection,
    now: DateTime<FixedOffset>,
) -> Vec<&'a T> {
    filter_by_range_with(records, range, now, |record| record.record_date())
}

/// Keeps records whose local calendar day falls inside `range`, in input
/// order. Outside of `All`, records without a parseable date are dropped.
pub fn filter_by_range_with<'a, T, F>(
    records: &'a [T],
    range: &RangeSelection,
    now: DateTime<FixedOffset>,
    date_of: F,
) -> Vec<&'a T>
where
    F: Fn(&T) -> Option<&str>,
{
    if *range == RangeSelection::All {
        return records.iter().collect();
    }

    let offset = *now.offset();
    let today = now.date_naive();

    records
        .iter()
        .filter(|record| {
            date_of(*record)
                .and_then(|raw| local_day(raw, &offset))
                .is_some_and(|day| range.contains_day(day, today))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, FixedOffset, NaiveDate};

    use super::{RangeSelection, filter_by_range};
    use crate::models::order::Order;

    fn now() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2024-03-15T14:30:00+05:00").unwrap()
    }

    fn order(id: &str, created_at: Option<&str>) -> Order {
        Order {
            booking_id: id.to_string(),
            created_at: created_at.map(str::to_string),
            ..Order::default()
        }
    }

    fn ids(records: &[&Order]) -> Vec<String> {
        records.iter().map(|o| o.booking_id.clone()).collect()
    }

    #[test]
    fn all_is_identity_including_undated_records() {
        let orders = vec![
            order("a", Some("2020-01-01")),
            order("b", None),
            order("c", Some("garbage")),
        ];
        let filtered = filter_by_range(&orders, &RangeSelection::All, now());
        assert_eq!(ids(&filtered), vec!["a", "b", "c"]);
    }

    #[test]
    fn today_boundaries_are_inclusive_at_day_granularity() {
        let orders = vec![
            order("start", Some("2024-03-15T00:00:00.000+05:00")),
            order("end", Some("2024-03-15T23:59:59.999+05:00")),
            order("tomorrow", Some("2024-03-16T00:00:00.000+05:00")),
            order("yesterday", Some("2024-03-14T23:59:59.999+05:00")),
        ];
        let filtered = filter_by_range(&orders, &RangeSelection::Today, now());
        assert_eq!(ids(&filtered), vec!["start", "end"]);
    }

    #[test]
    fn last_n_days_counts_today_as_day_one() {
        let orders = vec![
            order("oldest-in", Some("2024-03-09")),
            order("just-out", Some("2024-03-08T23:59:59+05:00")),
            order("today", Some("15/03/2024")),
            order("future", Some("2024-03-16")),
        ];
        let range = RangeSelection::LastNDays { days: 7 };
        let filtered = filter_by_range(&orders, &range, now());
        assert_eq!(ids(&filtered), vec!["oldest-in", "today"]);
    }

    #[test]
    fn current_month_runs_to_month_end() {
        let orders = vec![
            order("first", Some("2024-03-01")),
            order("last", Some("2024-03-31T23:00:00+05:00")),
            order("prev", Some("2024-02-29")),
            order("next", Some("2024-04-01")),
        ];
        let filtered = filter_by_range(&orders, &RangeSelection::CurrentMonth, now());
        assert_eq!(ids(&filtered), vec!["first", "last"]);
    }

    #[test]
    fn custom_range_treats_missing_bound_as_open() {
        let orders = vec![
            order("a", Some("2023-12-31")),
            order("b", Some("2024-01-10")),
            order("c", Some("2024-02-01")),
        ];
        let from_only = RangeSelection::Custom {
            from: NaiveDate::from_ymd_opt(2024, 1, 10),
            to: None,
        };
        assert_eq!(ids(&filter_by_range(&orders, &from_only, now())), vec!["b", "c"]);

        let to_only = RangeSelection::Custom {
            from: None,
            to: NaiveDate::from_ymd_opt(2024, 1, 10),
        };
        assert_eq!(ids(&filter_by_range(&orders, &to_only, now())), vec!["a", "b"]);
    }

    #[test]
    fn undated_records_are_excluded_outside_all() {
        let orders = vec![order("none", None), order("bad", Some("n/a"))];
        let open = RangeSelection::Custom { from: None, to: None };
        assert!(filter_by_range(&orders, &open, now()).is_empty());
    }

    #[test]
    fn filtering_is_idempotent() {
        let orders = vec![
            order("a", Some("2024-03-14")),
            order("b", Some("2024-03-01")),
            order("c", Some("2024-03-15")),
        ];
        let range = RangeSelection::LastNDays { days: 7 };
        let once = filter_by_range(&orders, &range, now());
        let twice = filter_by_range(&once, &range, now());
        let twice_ids: Vec<String> = twice.iter().map(|o| o.booking_id.clone()).collect();
        assert_eq!(ids(&once), twice_ids);
    }

    #[test]
    fn parse_accepts_quick_ranges_and_rejects_garbage() {
        assert_eq!(RangeSelection::parse(None, None, None).unwrap(), RangeSelection::All);
        assert_eq!(
            RangeSelection::parse(Some("15"), None, None).unwrap(),
            RangeSelection::LastNDays { days: 15 }
        );
        assert_eq!(
            RangeSelection::parse(Some("current"), None, None).unwrap(),
            RangeSelection::CurrentMonth
        );
        assert_eq!(
            RangeSelection::parse(Some("custom"), Some("2024-01-01"), Some("")).unwrap(),
            RangeSelection::Custom {
                from: NaiveDate::from_ymd_opt(2024, 1, 1),
                to: None
            }
        );
        assert!(RangeSelection::parse(Some("0"), None, None).is_err());
        assert!(RangeSelection::parse(Some("forever"), None, None).is_err());
        assert!(RangeSelection::parse(Some("custom"), Some("01/01/2024"), None).is_err());
    }
}
