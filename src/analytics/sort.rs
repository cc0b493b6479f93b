use std::cmp::Ordering;

use chrono::{DateTime, FixedOffset, Offset, Utc};

use crate::analytics::dates::parse_instant;
use crate::error::AppError;
use crate::models::order::Order;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    Date,
    Cod,
    Charges,
    Status,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortKey {
    pub fn parse(raw: Option<&str>) -> Result<Self, AppError> {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            None | Some("") | Some("date") => Ok(SortKey::Date),
            Some("cod") => Ok(SortKey::Cod),
            Some("charges") => Ok(SortKey::Charges),
            Some("status") => Ok(SortKey::Status),
            Some(other) => Err(AppError::BadRequest(format!("unknown sort key: {other}"))),
        }
    }
}

impl SortDirection {
    pub fn parse(raw: Option<&str>) -> Result<Self, AppError> {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            None | Some("") | Some("desc") => Ok(SortDirection::Desc),
            Some("asc") => Ok(SortDirection::Asc),
            Some(other) => Err(AppError::BadRequest(format!("unknown sort direction: {other}"))),
        }
    }
}

enum SortValue {
    Date(Option<DateTime<FixedOffset>>),
    Amount(f64),
    Text(String),
}

fn sort_value(order: &Order, key: SortKey, offset: &FixedOffset) -> SortValue {
    match key {
        SortKey::Date => SortValue::Date(
            order
                .created_at
                .as_deref()
                .and_then(|raw| parse_instant(raw, offset)),
        ),
        SortKey::Cod => SortValue::Amount(order.cod_amount),
        SortKey::Charges => SortValue::Amount(order.service_charges),
        SortKey::Status => SortValue::Text(order.status.as_str().to_lowercase()),
    }
}

fn compare(a: &SortValue, b: &SortValue, direction: SortDirection) -> Ordering {
    let directed = |ord: Ordering| match direction {
        SortDirection::Asc => ord,
        SortDirection::Desc => ord.reverse(),
    };

    match (a, b) {
        // Undated rows stay at the bottom whichever way the table is sorted.
        (SortValue::Date(None), SortValue::Date(None)) => Ordering::Equal,
        (SortValue::Date(None), SortValue::Date(Some(_))) => Ordering::Greater,
        (SortValue::Date(Some(_)), SortValue::Date(None)) => Ordering::Less,
        (SortValue::Date(Some(x)), SortValue::Date(Some(y))) => directed(x.cmp(y)),
        (SortValue::Amount(x), SortValue::Amount(y)) => directed(x.total_cmp(y)),
        (SortValue::Text(x), SortValue::Text(y)) => directed(x.cmp(y)),
        _ => Ordering::Equal,
    }
}

/// Sorts with UTC as the zone for timestamps that carry no offset.
pub fn sort_records(records: &[Order], key: SortKey, direction: SortDirection) -> Vec<&Order> {
    sort_records_in(records, key, direction, &Utc.fix())
}

/// Stable sort; equal keys keep their input order in both directions.
pub fn sort_records_in<'a, T>(
    records: &'a [T],
    key: SortKey,
    direction: SortDirection,
    offset: &FixedOffset,
) -> Vec<&'a T>
where
    T: std::borrow::Borrow<Order>,
{
    let mut keyed: Vec<(usize, SortValue, &'a T)> = records
        .iter()
        .enumerate()
        .map(|(index, record)| (index, sort_value(record.borrow(), key, offset), record))
        .collect();

    keyed.sort_by(|(ia, va, _), (ib, vb, _)| compare(va, vb, direction).then(ia.cmp(ib)));

    keyed.into_iter().map(|(_, _, record)| record).collect()
}
