use chrono::{DateTime, Duration, NaiveDate, Utc};
use regex::Regex;
use tracing::debug;

use crate::extract::{extract_field, parse_date};

/// Template parameter carrying the event start instant.
pub const TIME_START_FIELD: &str = "time_start";
/// Template parameter carrying the event end instant.
pub const TIME_END_FIELD: &str = "time_end";
/// Template parameter carrying the reader-facing event name.
pub const NAME_FIELD: &str = "name";

/// Window synthesized from a title-embedded date, matching the weekly
/// rotation cadence of date-keyed event pages.
const TITLE_FALLBACK_DAYS: i64 = 7;

/// Sentinel end instant for events with a start but no defined end.
/// Classification treats it as always after now.
pub fn permanent_end() -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(2030, 12, 31)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .unwrap()
}

/// Three-way temporal classification relative to a reference instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventStatus {
    Future,
    Ongoing,
    Past,
}

/// Resolved `(start, end)` pair. `start <= end` is not guaranteed by wiki
/// input and is tolerated everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl EventWindow {
    pub fn is_permanent(&self) -> bool {
        self.end == permanent_end()
    }
}

/// A fetched event page: wiki title plus raw template source.
#[derive(Debug, Clone)]
pub struct RawEvent {
    pub title: String,
    pub wikitext: String,
}

/// Fully resolved event, recomputed fresh on every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEvent {
    pub display_name: String,
    pub window: EventWindow,
    pub status: EventStatus,
    pub remaining_label: String,
}

impl ResolvedEvent {
    /// `MM/DD - MM/DD` range, with `Permanent` standing in for an
    /// open-ended end.
    pub fn date_range_label(&self) -> String {
        let start = self.window.start.format("%m/%d");
        if self.window.is_permanent() {
            format!("{start} - Permanent")
        } else {
            format!("{start} - {}", self.window.end.format("%m/%d"))
        }
    }
}

/// Resolve an event window from wikitext and title.
///
/// Fallback chain, first success wins:
/// 1. `time_start` and `time_end` both parse: explicit range.
/// 2. `time_start` parses, `time_end` absent or literally `none`:
///    permanent window.
/// 3. The title embeds a `YYYY-MM-DD` date: that date plus seven days.
pub fn resolve_window(title: &str, wikitext: &str) -> Option<EventWindow> {
    let start_raw = extract_field(wikitext, TIME_START_FIELD);
    let end_raw = extract_field(wikitext, TIME_END_FIELD);

    let start = start_raw.as_deref().and_then(parse_date);
    let end = end_raw.as_deref().and_then(parse_date);

    if let (Some(start), Some(end)) = (start, end) {
        return Some(EventWindow { start, end });
    }

    if let Some(start) = start {
        let end_is_none = match end_raw.as_deref() {
            None => true,
            Some(raw) => raw.trim().eq_ignore_ascii_case("none"),
        };
        if end_is_none {
            return Some(EventWindow {
                start,
                end: permanent_end(),
            });
        }
    }

    window_from_title(title)
}

fn window_from_title(title: &str) -> Option<EventWindow> {
    let date_pattern = Regex::new(r"(\d{4})-(\d{2})-(\d{2})").unwrap();
    let caps = date_pattern.captures(title)?;

    let year = caps[1].parse().ok()?;
    let month = caps[2].parse().ok()?;
    let day = caps[3].parse().ok()?;
    let start = NaiveDate::from_ymd_opt(year, month, day)?
        .and_hms_opt(0, 0, 0)?
        .and_utc();

    Some(EventWindow {
        start,
        end: start + Duration::days(TITLE_FALLBACK_DAYS),
    })
}

/// Classify a window against a reference instant.
///
/// Comparison is calendar-date granular: an event live at any point of a
/// day counts as ongoing for that whole day.
pub fn classify(window: &EventWindow, now: DateTime<Utc>) -> EventStatus {
    if now.date_naive() < window.start.date_naive() {
        return EventStatus::Future;
    }
    if !window.is_permanent() && now.date_naive() > window.end.date_naive() {
        return EventStatus::Past;
    }
    EventStatus::Ongoing
}

/// Human-readable time left until `end`, floored to whole units.
pub fn remaining_label(end: DateTime<Utc>, now: DateTime<Utc>) -> String {
    if end == permanent_end() {
        return "Permanent".to_string();
    }
    if end <= now {
        return "Ended".to_string();
    }

    let left = end - now;
    let days = left.num_days();
    let hours = left.num_hours();
    let minutes = left.num_minutes();

    if days >= 1 {
        format!("{}d {}h", days, hours - days * 24)
    } else if hours >= 1 {
        format!("{}h {}m", hours, minutes - hours * 60)
    } else {
        format!("{}m", minutes)
    }
}

/// Reader-friendly event label, distinct from the wiki's page-key title.
///
/// Prefers an explicit `name` field; otherwise strips a trailing
/// `/YYYY-MM-DD` or ` YYYY-MM-DD` suffix from the title.
pub fn derive_display_name(wikitext: &str, title: &str) -> String {
    if let Some(name) = extract_field(wikitext, NAME_FIELD) {
        if !name.is_empty() && name != title {
            return name;
        }
    }

    let suffix = Regex::new(r"[/ ]\d{4}-\d{2}-\d{2}$").unwrap();
    suffix.replace(title, "").to_string()
}

/// Resolve one event page against a reference instant.
///
/// Returns `None` when no window is resolvable; that is insufficient data,
/// not an error, and surfaces only as a debug diagnostic.
pub fn resolve(title: &str, wikitext: &str, now: DateTime<Utc>) -> Option<ResolvedEvent> {
    let Some(window) = resolve_window(title, wikitext) else {
        debug!(title, "no event window resolvable");
        return None;
    };

    let status = classify(&window, now);
    debug!(
        title,
        start = %window.start,
        end = %window.end,
        ?status,
        "resolved event window"
    );

    Some(ResolvedEvent {
        display_name: derive_display_name(wikitext, title),
        window,
        status,
        remaining_label: remaining_label(window.end, now),
    })
}

/// Resolve a batch and keep only ongoing events, ranked soonest-ending
/// first with permanent events last. The sort is stable, so ties keep the
/// original fetch order.
pub fn resolve_all(raw_events: &[RawEvent], now: DateTime<Utc>) -> Vec<ResolvedEvent> {
    let mut ongoing: Vec<ResolvedEvent> = raw_events
        .iter()
        .filter_map(|event| resolve(&event.title, &event.wikitext, now))
        .filter(|event| event.status == EventStatus::Ongoing)
        .collect();

    ongoing.sort_by_key(|event| (event.window.is_permanent(), event.window.end));
    ongoing
}
