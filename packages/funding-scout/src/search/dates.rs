//! Publish-date normalization.
//!
//! Search providers report dates as ISO strings, relative phrases ("3 days ago")
//! or loosely formatted calendar dates. Everything is mapped to UTC; anything
//! unparseable becomes `None`.

use std::sync::LazyLock;

use chrono::{DateTime, Duration, Months, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;

static RE_RELATIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(\d+|an?|one)\s+(minute|min|hour|hr|day|week|month|year)s?\s+ago$",
    )
    .unwrap()
});

/// Calendar formats tried after ISO and relative parsing fail.
const DATE_FORMATS: &[&str] = &[
    "%b %d, %Y",
    "%d %b %Y",
    "%d %b, %Y",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d.%m.%Y",
];

/// Normalize a provider date relative to `now`.
pub fn normalize_published_date(raw: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    parse_iso(raw)
        .or_else(|| parse_relative(raw, now))
        .or_else(|| parse_generic(raw))
}

fn parse_iso(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

fn parse_relative(raw: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let caps = RE_RELATIVE.captures(raw)?;
    let amount: u32 = match caps[1].to_lowercase().as_str() {
        "a" | "an" | "one" => 1,
        n => n.parse().ok()?,
    };

    match caps[2].to_lowercase().as_str() {
        "minute" | "min" => Some(now - Duration::minutes(amount.into())),
        "hour" | "hr" => Some(now - Duration::hours(amount.into())),
        "day" => Some(now - Duration::days(amount.into())),
        "week" => Some(now - Duration::weeks(amount.into())),
        "month" => now.checked_sub_months(Months::new(amount)),
        "year" => now.checked_sub_months(Months::new(amount.checked_mul(12)?)),
        _ => None,
    }
}

fn parse_generic(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn iso_dates_pass_through() {
        assert_eq!(
            normalize_published_date("2024-06-01", now()),
            Some(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(
            normalize_published_date("2024-06-01T08:30:00Z", now()),
            Some(Utc.with_ymd_and_hms(2024, 6, 1, 8, 30, 0).unwrap())
        );
    }

    #[test]
    fn relative_phrases_subtract_from_now() {
        assert_eq!(
            normalize_published_date("3 days ago", now()),
            Some(now() - Duration::days(3))
        );
        assert_eq!(
            normalize_published_date("1 week ago", now()),
            Some(now() - Duration::days(7))
        );
        assert_eq!(
            normalize_published_date("2 months ago", now()),
            Some(Utc.with_ymd_and_hms(2024, 4, 15, 12, 0, 0).unwrap())
        );
        assert_eq!(
            normalize_published_date("a year ago", now()),
            Some(Utc.with_ymd_and_hms(2023, 6, 15, 12, 0, 0).unwrap())
        );
        assert_eq!(
            normalize_published_date("5 hours ago", now()),
            Some(now() - Duration::hours(5))
        );
    }

    #[test]
    fn calendar_formats_parse() {
        let expected = Some(Utc.with_ymd_and_hms(2024, 3, 3, 0, 0, 0).unwrap());
        assert_eq!(normalize_published_date("Mar 3, 2024", now()), expected);
        assert_eq!(normalize_published_date("03/03/2024", now()), expected);
        assert_eq!(normalize_published_date("2024/03/03", now()), expected);
    }

    #[test]
    fn garbage_is_none() {
        assert_eq!(normalize_published_date("", now()), None);
        assert_eq!(normalize_published_date("sometime soon", now()), None);
        assert_eq!(normalize_published_date("ages ago", now()), None);
    }
}
