use std::fmt::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::WatchError;
use eventwatch_core::ResolvedEvent;

/// One ongoing event as exposed to downstream consumers.
#[derive(Debug, Serialize)]
pub struct ReportEntry {
    pub display_name: String,
    pub starts: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ends: Option<String>,
    pub permanent: bool,
    pub remaining: String,
    pub date_range: String,
}

impl From<&ResolvedEvent> for ReportEntry {
    fn from(event: &ResolvedEvent) -> Self {
        let permanent = event.window.is_permanent();
        ReportEntry {
            display_name: event.display_name.clone(),
            starts: event.window.start.to_rfc3339(),
            ends: (!permanent).then(|| event.window.end.to_rfc3339()),
            permanent,
            remaining: event.remaining_label.clone(),
            date_range: event.date_range_label(),
        }
    }
}

pub fn render_text(events: &[ResolvedEvent], category: &str, now: DateTime<Utc>) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Ongoing events in Category:{} as of {}",
        category,
        now.format("%Y-%m-%d %H:%M UTC")
    );

    if events.is_empty() {
        let _ = writeln!(out, "  (no ongoing events)");
        return out;
    }

    for event in events {
        let remaining = if event.window.is_permanent() {
            "Permanent".to_string()
        } else {
            format!("{} remaining", event.remaining_label)
        };
        let _ = writeln!(
            out,
            "  {}  [{}]  ({})",
            event.display_name,
            event.date_range_label(),
            remaining
        );
    }

    out
}

pub fn render_json(events: &[ResolvedEvent]) -> Result<String, WatchError> {
    let entries: Vec<ReportEntry> = events.iter().map(ReportEntry::from).collect();
    Ok(serde_json::to_string_pretty(&entries)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use eventwatch_core::{RawEvent, resolve_all};

    fn sample_events(now: DateTime<Utc>) -> Vec<ResolvedEvent> {
        let raw = vec![
            RawEvent {
                title: "Bountiful Crescendo/2025-09-11".to_string(),
                wikitext:
                    "|name = Bountiful Crescendo\n|time_start = 2025-09-11 04:00\n|time_end = 2025-09-18 04:00\n"
                        .to_string(),
            },
            RawEvent {
                title: "Pioneer Podcast".to_string(),
                wikitext: "|time_start = 2025-09-01\n|time_end = none\n".to_string(),
            },
        ];
        resolve_all(&raw, now)
    }

    #[test]
    fn text_report_lists_ranked_events() {
        let now = Utc.with_ymd_and_hms(2025, 9, 15, 0, 0, 0).unwrap();
        let report = render_text(&sample_events(now), "Events", now);

        assert!(report.starts_with("Ongoing events in Category:Events as of 2025-09-15 00:00 UTC"));
        assert!(report.contains("Bountiful Crescendo  [09/11 - 09/18]  (3d 4h remaining)"));
        assert!(report.contains("Pioneer Podcast  [09/01 - Permanent]  (Permanent)"));

        let crescendo = report.find("Bountiful Crescendo").unwrap();
        let podcast = report.find("Pioneer Podcast").unwrap();
        assert!(crescendo < podcast, "bounded event should rank first");
    }

    #[test]
    fn empty_report_says_so() {
        let now = Utc.with_ymd_and_hms(2025, 9, 15, 0, 0, 0).unwrap();
        let report = render_text(&[], "Events", now);
        assert!(report.contains("(no ongoing events)"));
    }

    #[test]
    fn json_report_round_trips() {
        let now = Utc.with_ymd_and_hms(2025, 9, 15, 0, 0, 0).unwrap();
        let report = render_json(&sample_events(now)).expect("serializable");

        let parsed: serde_json::Value = serde_json::from_str(&report).expect("valid JSON");
        let entries = parsed.as_array().expect("array");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["display_name"], "Bountiful Crescendo");
        assert_eq!(entries[0]["date_range"], "09/11 - 09/18");
        assert_eq!(entries[0]["permanent"], false);
        assert_eq!(entries[1]["permanent"], true);
        assert!(entries[1].get("ends").is_none());
    }
}
