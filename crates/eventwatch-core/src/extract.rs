use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::RegexBuilder;

/// Literal values meaning "no date supplied" rather than "unparseable".
const ABSENT_MARKERS: [&str; 3] = ["none", "null", "n/a"];

/// Ordered table of textual date formats seen in wiki event templates.
/// The flag marks formats that carry a time-of-day component; date-only
/// formats resolve to midnight.
const DATE_FORMATS: [(&str, bool); 6] = [
    ("%Y-%m-%d %H:%M", true),
    ("%Y/%m/%d %H:%M", true),
    ("%Y-%m-%d", false),
    ("%Y/%m/%d", false),
    ("%B %d, %Y", false),
    ("%b %d, %Y", false),
];

/// Pull a `|field = value` pair out of raw wikitext.
///
/// Matches a template parameter line: pipe, optional whitespace, the field
/// name (case-insensitive), optional whitespace, `=`, then everything up to
/// the next pipe or newline. Returns the trimmed value of the first match,
/// with any template-closing braces removed (the last parameter of an
/// inline `{{Event|...}}` call carries them).
pub fn extract_field(wikitext: &str, field: &str) -> Option<String> {
    let pattern = format!(r"\|\s*{}\s*=\s*([^\n|]+)", regex::escape(field));
    let matcher = RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .build()
        .unwrap();

    matcher
        .captures(wikitext)
        .map(|caps| caps[1].trim().trim_end_matches("}}").trim_end().to_string())
}

/// Parse a wiki-authored date string into a UTC instant.
///
/// Absent markers and unrecognized formats both yield `None`; callers treat
/// the field as missing and fall back, never as an error. Naive timestamps
/// are wiki-local/UTC by convention and are tagged UTC here.
pub fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    let trimmed = text.trim();
    if trimmed.is_empty() || ABSENT_MARKERS.contains(&trimmed.to_ascii_lowercase().as_str()) {
        return None;
    }

    for (format, has_time) in DATE_FORMATS {
        let parsed = if has_time {
            NaiveDateTime::parse_from_str(trimmed, format).ok()
        } else {
            NaiveDate::parse_from_str(trimmed, format)
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        };

        if let Some(naive) = parsed {
            return Some(naive.and_utc());
        }
    }

    None
}
