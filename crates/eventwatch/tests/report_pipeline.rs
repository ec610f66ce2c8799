use chrono::{TimeZone, Utc};
use eventwatch::render::{render_json, render_text};
use eventwatch_core::{RawEvent, resolve_all};

// Fixture-driven walk through the whole wikitext-to-report pipeline,
// network layer excluded: raw page bodies in, rendered report out.

const CRESCENDO_PAGE: &str = "\
{{Event\n\
|name = Bountiful Crescendo\n\
|time_start = 2025-09-11 04:00\n\
|time_end = 2025-09-18 04:00\n\
}}";

const PODCAST_PAGE: &str = "\
{{Event\n\
|time_start = 2025-08-01\n\
|time_end = none\n\
}}";

const FINISHED_PAGE: &str = "\
{{Event\n\
|time_start = 2025-08-01\n\
|time_end = 2025-08-08\n\
}}";

fn fixture_events() -> Vec<RawEvent> {
    vec![
        RawEvent {
            title: "Pioneer Podcast".to_string(),
            wikitext: PODCAST_PAGE.to_string(),
        },
        RawEvent {
            title: "Bountiful Crescendo/2025-09-11".to_string(),
            wikitext: CRESCENDO_PAGE.to_string(),
        },
        RawEvent {
            title: "Gone Fishing/2025-08-01".to_string(),
            wikitext: FINISHED_PAGE.to_string(),
        },
        RawEvent {
            title: "Empty Page".to_string(),
            wikitext: String::new(),
        },
        RawEvent {
            title: "Dateless Stub".to_string(),
            wikitext: "just some prose, no template".to_string(),
        },
    ]
}

#[test]
fn pipeline_produces_ranked_text_report() {
    let now = Utc.with_ymd_and_hms(2025, 9, 15, 0, 0, 0).unwrap();
    let ongoing = resolve_all(&fixture_events(), now);
    let report = render_text(&ongoing, "Events", now);

    let expected = "\
Ongoing events in Category:Events as of 2025-09-15 00:00 UTC\n\
  Bountiful Crescendo  [09/11 - 09/18]  (3d 4h remaining)\n\
  Pioneer Podcast  [08/01 - Permanent]  (Permanent)\n";
    assert_eq!(report, expected);
}

#[test]
fn pipeline_excludes_past_and_unresolvable_pages() {
    let now = Utc.with_ymd_and_hms(2025, 9, 15, 0, 0, 0).unwrap();
    let ongoing = resolve_all(&fixture_events(), now);

    assert_eq!(ongoing.len(), 2);
    assert!(ongoing.iter().all(|event| {
        event.display_name != "Gone Fishing"
            && event.display_name != "Empty Page"
            && event.display_name != "Dateless Stub"
    }));
}

#[test]
fn pipeline_json_report_carries_the_same_ranking() {
    let now = Utc.with_ymd_and_hms(2025, 9, 15, 0, 0, 0).unwrap();
    let ongoing = resolve_all(&fixture_events(), now);
    let report = render_json(&ongoing).expect("serializable");

    let parsed: serde_json::Value = serde_json::from_str(&report).expect("valid JSON");
    let names: Vec<&str> = parsed
        .as_array()
        .expect("array")
        .iter()
        .map(|entry| entry["display_name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Bountiful Crescendo", "Pioneer Podcast"]);
}

#[test]
fn pipeline_with_everything_expired_reports_empty() {
    let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let raw = vec![RawEvent {
        title: "Gone Fishing/2025-08-01".to_string(),
        wikitext: FINISHED_PAGE.to_string(),
    }];

    let ongoing = resolve_all(&raw, now);
    assert!(ongoing.is_empty());

    let report = render_text(&ongoing, "Events", now);
    assert!(report.contains("(no ongoing events)"));
}
