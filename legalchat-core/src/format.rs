//! Formatting helpers shared across UIs.

use chrono::{DateTime, NaiveDateTime, Utc};

/// Parse a backend timestamp.
///
/// Accepts RFC 3339 and the naive `YYYY-MM-DDTHH:MM:SS[.ffffff]` form the
/// backend emits, which is taken as UTC.
pub fn parse_timestamp(ts: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(ts) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Format a timestamp as relative time (e.g., "2m ago").
pub fn format_relative_time(ts: DateTime<Utc>) -> String {
    let now = Utc::now();
    let duration = now.signed_duration_since(ts);

    if duration.num_seconds() < 0 {
        "just now".to_string()
    } else if duration.num_seconds() < 60 {
        format!("{}s ago", duration.num_seconds())
    } else if duration.num_minutes() < 60 {
        format!("{}m ago", duration.num_minutes())
    } else if duration.num_hours() < 24 {
        format!("{}h ago", duration.num_hours())
    } else if duration.num_days() < 7 {
        format!("{}d ago", duration.num_days())
    } else {
        ts.format("%b %d").to_string()
    }
}

/// Relative time for a backend timestamp string, or "-" if it doesn't parse.
pub fn format_relative_str(ts: &str) -> String {
    match parse_timestamp(ts) {
        Some(ts) => format_relative_time(ts),
        None => "-".to_string(),
    }
}

/// Wall-clock time (HH:MM) of a message timestamp.
pub fn format_clock(ts: &str) -> String {
    parse_timestamp(ts)
        .map(|dt| dt.format("%H:%M").to_string())
        .unwrap_or_default()
}

/// Similarity score as a whole percentage.
pub fn format_similarity(score: f64) -> String {
    format!("{:.0}%", (score * 100.0).clamp(0.0, 100.0))
}

/// Character count in compact form (e.g., "12.3k chars").
pub fn format_length(chars: i64) -> String {
    if chars >= 1_000_000 {
        format!("{:.1}M chars", chars as f64 / 1_000_000.0)
    } else if chars >= 1_000 {
        format!("{:.1}k chars", chars as f64 / 1_000.0)
    } else {
        format!("{} chars", chars)
    }
}

/// Truncate to at most `max` characters, ending with an ellipsis when cut.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut out: String = text.chars().take(max - 1).collect();
    out.push('…');
    out
}

/// Collapse whitespace runs (including newlines) into single spaces.
pub fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Timelike};

    #[test]
    fn test_parse_timestamp_forms() {
        let naive = parse_timestamp("2025-03-01T14:05:09.123456").unwrap();
        assert_eq!(naive.hour(), 14);
        assert_eq!(naive.minute(), 5);

        let rfc = parse_timestamp("2025-03-01T14:05:09+02:00").unwrap();
        assert_eq!(rfc.hour(), 12);

        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_relative_time() {
        assert_eq!(
            format_relative_time(Utc::now() - Duration::minutes(5)),
            "5m ago"
        );
        assert_eq!(
            format_relative_time(Utc::now() + Duration::minutes(5)),
            "just now"
        );
        assert_eq!(format_relative_str("garbage"), "-");
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock("2025-03-01T09:30:00"), "09:30");
        assert_eq!(format_clock(""), "");
    }

    #[test]
    fn test_similarity_and_length() {
        assert_eq!(format_similarity(0.873), "87%");
        assert_eq!(format_similarity(1.2), "100%");
        assert_eq!(format_length(950), "950 chars");
        assert_eq!(format_length(12_345), "12.3k chars");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("contract", 5), "cont…");
        assert_eq!(truncate("§§§§§§", 3), "§§…");
    }

    #[test]
    fn test_single_line() {
        assert_eq!(single_line("a\n  b\tc "), "a b c");
    }
}
