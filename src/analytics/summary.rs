use std::borrow::Borrow;

use chrono::{DateTime, Days, FixedOffset, NaiveDate};
use serde::Serialize;

use crate::analytics::dates::local_day;
use crate::analytics::status::{StatusBucket, classify};
use crate::models::order::Order;

pub const TREND_DAYS: u64 = 7;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayBucket {
    pub date: NaiveDate,
    pub cod: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateTotals {
    pub count: usize,
    pub total_cod: f64,
    pub total_service_charges: f64,
    pub net_amount: f64,
    /// Delivered COD per day, oldest first, always `TREND_DAYS` entries.
    pub by_day: Vec<DayBucket>,
}

pub fn summarize<I>(records: I, now: DateTime<FixedOffset>) -> AggregateTotals
where
    I: IntoIterator,
    I::Item: Borrow<Order>,
{
    summarize_where(records, now, |_| true)
}

/// Reduces the records admitted by `predicate` into dashboard totals.
pub fn summarize_where<I, P>(
    records: I,
    now: DateTime<FixedOffset>,
    predicate: P,
) -> AggregateTotals
where
    I: IntoIterator,
    I::Item: Borrow<Order>,
    P: Fn(&Order) -> bool,
{
    let offset = *now.offset();
    let mut by_day = empty_trend(now.date_naive());

    let mut count = 0;
    let mut total_cod = 0.0;
    let mut total_service_charges = 0.0;

    for record in records {
        let order: &Order = record.borrow();
        if !predicate(order) {
            continue;
        }

        count += 1;
        total_cod += order.cod_amount;
        total_service_charges += order.service_charges;

        if classify(&order.status) != StatusBucket::Delivered {
            continue;
        }

        let day = order
            .delivered_at
            .as_deref()
            .and_then(|raw| local_day(raw, &offset))
            .or_else(|| order.created_at.as_deref().and_then(|raw| local_day(raw, &offset)));

        if let Some(bucket) = day.and_then(|d| by_day.iter_mut().find(|b| b.date == d)) {
            bucket.cod += order.cod_amount;
            bucket.count += 1;
        }
    }

    AggregateTotals {
        count,
        total_cod,
        total_service_charges,
        net_amount: total_cod - total_service_charges,
        by_day,
    }
}

fn empty_trend(today: NaiveDate) -> Vec<DayBucket> {
    (0..TREND_DAYS)
        .rev()
        .filter_map(|back| today.checked_sub_days(Days::new(back)))
        .map(|date| DayBucket {
            date,
            cod: 0.0,
            count: 0,
        })
        .collect()
}
