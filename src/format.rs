//! Text helpers shared by the table renderers: HTML escaping and the
//! date/time formats the panel displays and filters on.

use chrono::{Duration, NaiveDate};
use regex::Regex;
use std::sync::OnceLock;

/// Days covered by the default date filter, ending today.
pub const DEFAULT_RANGE_DAYS: i64 = 30;

fn zone_suffix() -> &'static Regex {
    static ZONE: OnceLock<Regex> = OnceLock::new();
    ZONE.get_or_init(|| Regex::new(r"([+-]\d{2}:\d{2}|Z)$").expect("static regex"))
}

/// Escape text for interpolation into HTML element content or a quoted
/// attribute value.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Turn an ISO-8601 timestamp into `YYYY-MM-DD HH:MM:SS` for display.
///
/// Only the first `T` is replaced and a trailing `Z` or `±HH:MM` zone is
/// dropped; the clock value itself is not converted to any other zone.
///
/// ```
/// use pssu_admin::format::to_date_time;
/// assert_eq!(to_date_time("2024-01-02T03:04:05+09:00"), "2024-01-02 03:04:05");
/// assert_eq!(to_date_time("2024-01-02T03:04:05Z"), "2024-01-02 03:04:05");
/// assert_eq!(to_date_time(""), "");
/// ```
pub fn to_date_time(s: &str) -> String {
    if s.is_empty() {
        return String::new();
    }
    let spaced = s.replacen('T', " ", 1);
    zone_suffix().replace(&spaced, "").into_owned()
}

/// `YYYY-MM-DD`, the format `<input type="date">` reads and writes.
pub fn format_local_iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Default `(from, to)` bounds for the event date filter.
pub fn default_date_range(today: NaiveDate) -> (String, String) {
    let from = today - Duration::days(DEFAULT_RANGE_DAYS);
    (format_local_iso(from), format_local_iso(today))
}

/// Today's date in the viewer's local calendar.
pub fn local_today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// The `YYYY-MM-DD` prefix of a normalized timestamp. Shorter strings are
/// returned whole.
pub fn date_prefix(s: &str) -> &str {
    s.get(..10).unwrap_or(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("plain"), "plain");
        assert_eq!(
            escape_html(r#"<b>"Kim" & 'Lee'</b>"#),
            "&lt;b&gt;&quot;Kim&quot; &amp; &#39;Lee&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn test_to_date_time() {
        assert_eq!(to_date_time("2024-01-02T03:04:05+09:00"), "2024-01-02 03:04:05");
        assert_eq!(to_date_time("2024-01-02T03:04:05-05:30"), "2024-01-02 03:04:05");
        assert_eq!(to_date_time("2024-01-02 03:04:05"), "2024-01-02 03:04:05");
        // fractional seconds are kept as sent
        assert_eq!(to_date_time("2024-01-02T03:04:05.120Z"), "2024-01-02 03:04:05.120");
    }

    #[test]
    fn test_default_date_range() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let (from, to) = default_date_range(today);
        assert_eq!(from, "2024-02-14");
        assert_eq!(to, "2024-03-15");

        let new_year = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        assert_eq!(default_date_range(new_year).0, "2024-12-11");
    }

    #[test]
    fn test_date_prefix() {
        assert_eq!(date_prefix("2024-01-02 03:04:05"), "2024-01-02");
        assert_eq!(date_prefix("2024-01"), "2024-01");
        assert_eq!(date_prefix(""), "");
    }
}
