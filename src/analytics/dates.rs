use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y"];

/// Parses a backend timestamp into wall-clock time at `offset`.
///
/// Timestamps carrying their own offset (RFC 3339, `Z` suffix) are converted;
/// naive date-times and the date-only forms `YYYY-MM-DD`, `DD/MM/YYYY` and
/// `DD-MM-YYYY` are read as already being local to `offset`. Date-only values
/// land on midnight.
pub fn parse_local(raw: &str, offset: &FixedOffset) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(offset).naive_local());
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(parsed);
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Calendar day of `raw` as seen from `offset`.
pub fn local_day(raw: &str, offset: &FixedOffset) -> Option<NaiveDate> {
    parse_local(raw, offset).map(|dt| dt.date())
}

/// Absolute instant of `raw`; naive forms are pinned to `offset`.
pub fn parse_instant(raw: &str, offset: &FixedOffset) -> Option<DateTime<FixedOffset>> {
    let local = parse_local(raw, offset)?;
    offset.from_local_datetime(&local).single()
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, NaiveDate};

    use super::{local_day, parse_instant, parse_local};

    fn pkt() -> FixedOffset {
        FixedOffset::east_opt(5 * 3600).unwrap()
    }

    #[test]
    fn utc_timestamp_shifts_into_local_day() {
        let day = local_day("2024-03-09T21:30:00Z", &pkt()).unwrap();
        assert_eq!(day, NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
    }

    #[test]
    fn legacy_forms_are_day_first() {
        let expected = NaiveDate::from_ymd_opt(2024, 2, 5).unwrap();
        assert_eq!(local_day("05/02/2024", &pkt()), Some(expected));
        assert_eq!(local_day("05-02-2024", &pkt()), Some(expected));
        assert_eq!(local_day("2024-02-05", &pkt()), Some(expected));
    }

    #[test]
    fn naive_datetime_keeps_wall_clock() {
        let parsed = parse_local("2024-02-05T23:59:59.999", &pkt()).unwrap();
        assert_eq!(parsed.date(), NaiveDate::from_ymd_opt(2024, 2, 5).unwrap());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(parse_local("", &pkt()).is_none());
        assert!(parse_local("not a date", &pkt()).is_none());
        assert!(parse_local("31/02/2024", &pkt()).is_none());
        assert!(parse_instant("yesterday", &pkt()).is_none());
    }

    #[test]
    fn instants_compare_across_forms() {
        let a = parse_instant("2024-01-01T00:00:00+05:00", &pkt()).unwrap();
        let b = parse_instant("01/01/2024", &pkt()).unwrap();
        assert_eq!(a, b);
    }
}
