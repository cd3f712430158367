//! Utility functions for date labels, log previews and output paths.
//!
//! - Parsing the free-form date labels shown on listing rows
//! - Truncating long strings for log fields
//! - Preparing the directory an output file is written into

use std::io;
use std::path::Path;

use chrono::{DateTime, Local, Months, NaiveDate, NaiveDateTime, TimeDelta};
use once_cell::sync::Lazy;
use regex::Regex;
use tokio::fs;
use tracing::{debug, instrument};

static ORDINAL_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d{1,2})(st|nd|rd|th)\b").expect("ordinal regex compiles"));

static RELATIVE_AGO: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(an?|\d+) (second|sec|minute|min|hour|hr|day|week|month|year)s? ago$")
        .expect("relative date regex compiles")
});

static WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex compiles"));

const DATETIME_FORMATS: &[&str] = &[
    "%d %b %Y %H:%M",
    "%d %B %Y %H:%M",
    "%b %d, %Y %H:%M",
    "%B %d, %Y %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%d %b %Y", "%d %B %Y", "%b %d, %Y", "%B %d, %Y", "%Y-%m-%d"];

/// Parse a listing date label into a naive timestamp.
///
/// Offsets in RFC 3339 / RFC 2822 labels are dropped, keeping the wall-clock
/// time as written. Date-only labels resolve to midnight. Relative labels
/// ("3 hours ago", "Yesterday") are resolved against the local clock; see
/// [`parse_date_label_at`].
///
/// # Examples
///
/// ```ignore
/// assert!(parse_date_label("12 Aug 2024").is_some());
/// assert!(parse_date_label("1st August 2024 14:30").is_some());
/// assert!(parse_date_label("2 hours ago").is_some());
/// assert!(parse_date_label("yesterday-ish").is_none());
/// ```
pub fn parse_date_label(label: &str) -> Option<NaiveDateTime> {
    parse_date_label_at(label, Local::now().naive_local())
}

/// [`parse_date_label`] with an explicit reference time for relative labels.
///
/// # Arguments
///
/// * `label` - Free-form date text from a listing row
/// * `now` - Instant that "ago", "today" and "yesterday" count back from
///
/// # Returns
///
/// The timestamp, or `None` when no known absolute or relative form matches.
/// Relative labels keep the time of day of `now`.
pub fn parse_date_label_at(label: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let cleaned = ORDINAL_SUFFIX.replace_all(label.trim(), "$1");
    let cleaned = WHITESPACE.replace_all(&cleaned, " ");
    let cleaned = cleaned.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(cleaned) {
        return Some(dt.naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(cleaned) {
        return Some(dt.naive_local());
    }

    let parsed = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(cleaned, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(cleaned, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .or_else(|| parse_relative(cleaned, now));

    debug!(label, ?parsed, "Parsed date label");
    parsed
}

fn parse_relative(label: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    match label.to_ascii_lowercase().as_str() {
        "now" | "just now" | "today" => return Some(now),
        "yesterday" => return now.checked_sub_signed(TimeDelta::try_days(1)?),
        _ => {}
    }

    let caps = RELATIVE_AGO.captures(label)?;
    let amount: i64 = match &caps[1] {
        n if n.eq_ignore_ascii_case("a") || n.eq_ignore_ascii_case("an") => 1,
        n => n.parse().ok()?,
    };
    let months = |per: u32| {
        let n = u32::try_from(amount).ok()?.checked_mul(per)?;
        now.checked_sub_months(Months::new(n))
    };

    match caps[2].to_ascii_lowercase().as_str() {
        "second" | "sec" => now.checked_sub_signed(TimeDelta::try_seconds(amount)?),
        "minute" | "min" => now.checked_sub_signed(TimeDelta::try_minutes(amount)?),
        "hour" | "hr" => now.checked_sub_signed(TimeDelta::try_hours(amount)?),
        "day" => now.checked_sub_signed(TimeDelta::try_days(amount)?),
        "week" => now.checked_sub_signed(TimeDelta::try_weeks(amount)?),
        "month" => months(1),
        "year" => months(12),
        _ => None,
    }
}

/// Truncate a string for logging purposes.
///
/// Keeps the first `max` characters and appends how many bytes were cut.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}…(+{} bytes)", &s[..cut], s.len() - cut),
    }
}

/// Create the parent directory of `path` if it does not exist.
#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub async fn ensure_parent_dir(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent).await,
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn test_parse_day_month_year() {
        assert_eq!(parse_date_label("12 Aug 2024"), Some(at(2024, 8, 12, 0, 0)));
        assert_eq!(parse_date_label("02 August 2024"), Some(at(2024, 8, 2, 0, 0)));
        assert_eq!(parse_date_label("  12   Aug  2024 "), Some(at(2024, 8, 12, 0, 0)));
    }

    #[test]
    fn test_parse_month_first_and_ordinals() {
        assert_eq!(parse_date_label("Aug 12, 2024"), Some(at(2024, 8, 12, 0, 0)));
        assert_eq!(parse_date_label("August 21st, 2024"), Some(at(2024, 8, 21, 0, 0)));
        assert_eq!(parse_date_label("1st August 2024 14:30"), Some(at(2024, 8, 1, 14, 30)));
    }

    #[test]
    fn test_parse_iso_and_strip_offset() {
        assert_eq!(parse_date_label("2024-08-12"), Some(at(2024, 8, 12, 0, 0)));
        assert_eq!(parse_date_label("2024-08-12 09:15"), Some(at(2024, 8, 12, 9, 15)));
        assert_eq!(
            parse_date_label("2024-08-12T09:15:00+03:00"),
            Some(at(2024, 8, 12, 9, 15))
        );
        assert_eq!(
            parse_date_label("Mon, 12 Aug 2024 09:15:00 +0200"),
            Some(at(2024, 8, 12, 9, 15))
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_date_label(""), None);
        assert_eq!(parse_date_label("The Paypers"), None);
        assert_eq!(parse_date_label("31 Feb 2024"), None);
    }

    #[test]
    fn test_parse_relative_labels() {
        let now = at(2024, 8, 12, 15, 30);
        let parse = |label| parse_date_label_at(label, now);

        assert_eq!(parse("2 hours ago"), Some(at(2024, 8, 12, 13, 30)));
        assert_eq!(parse("an hour ago"), Some(at(2024, 8, 12, 14, 30)));
        assert_eq!(parse("45 mins ago"), Some(at(2024, 8, 12, 14, 45)));
        assert_eq!(parse("3 Days ago"), Some(at(2024, 8, 9, 15, 30)));
        assert_eq!(parse("1 week ago"), Some(at(2024, 8, 5, 15, 30)));
        assert_eq!(parse("a month ago"), Some(at(2024, 7, 12, 15, 30)));
        assert_eq!(parse("Yesterday"), Some(at(2024, 8, 11, 15, 30)));
        assert_eq!(parse(" Today "), Some(now));
        assert_eq!(parse("just  now"), Some(now));
    }

    #[test]
    fn test_parse_relative_rejects_unknown_forms() {
        let now = at(2024, 8, 12, 15, 30);
        assert_eq!(parse_date_label_at("2 hours from now", now), None);
        assert_eq!(parse_date_label_at("ages ago", now), None);
        assert_eq!(parse_date_label_at("99999999999999999999 days ago", now), None);
        assert_eq!(parse_date_label_at("12 Aug 2024", now), Some(at(2024, 8, 12, 0, 0)));
    }

    #[test]
    fn test_truncate_for_log() {
        assert_eq!(truncate_for_log("Hello, world!", 100), "Hello, world!");

        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.ends_with("…(+400 bytes)"));

        assert_eq!(truncate_for_log("Zürich payments", 2), "Zü…(+13 bytes)");
    }

    #[tokio::test]
    async fn test_ensure_parent_dir() {
        let root = std::env::temp_dir().join(format!("paypers_walker_utils_{}", std::process::id()));
        let file = root.join("nested").join("out.jsonl");
        ensure_parent_dir(&file).await.unwrap();
        assert!(root.join("nested").is_dir());
        ensure_parent_dir(Path::new("bare.jsonl")).await.unwrap();
        std::fs::remove_dir_all(&root).unwrap();
    }
}
