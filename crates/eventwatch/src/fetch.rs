use std::collections::HashMap;
use std::time::Duration;

use regex::Regex;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tokio::time::sleep;
use tracing::debug;

use crate::config::Tunables;
use crate::error::WatchError;

/// A candidate event page surfaced by a category listing.
#[derive(Debug, Clone)]
pub struct PageRef {
    pub title: String,
}

/// List the members of the configured event category.
pub async fn fetch_category_members(
    client: &Client,
    tunables: &Tunables,
) -> Result<Vec<PageRef>, WatchError> {
    let category_title = format!("Category:{}", tunables.category);
    let limit = tunables.fetch_limit.to_string();
    let params = [
        ("action", "query"),
        ("format", "json"),
        ("list", "categorymembers"),
        ("cmtitle", category_title.as_str()),
        ("cmlimit", limit.as_str()),
    ];

    let request = || async {
        client
            .get(&tunables.api_url)
            .query(&params)
            .send()
            .await
    };

    let response = fetch_with_retries("categorymembers", tunables, request).await?;
    if !response.status().is_success() {
        return Err(WatchError::Message(format!(
            "wiki API responded with {} while listing {}",
            response.status(),
            category_title
        )));
    }

    let payload: CategoryResponse = response.json().await?;
    let members = payload
        .query
        .map(|query| query.categorymembers)
        .unwrap_or_default()
        .into_iter()
        .map(|member| PageRef {
            title: member.title,
        })
        .collect();

    Ok(members)
}

/// Fetch the raw template source of one page.
///
/// Tries the revisions slot first; when that yields nothing, falls back to
/// the rendered `action=parse` output with markup stripped. Both failing
/// yields an empty string, which the resolver treats as "all fields
/// absent".
pub async fn fetch_page_content(
    client: &Client,
    tunables: &Tunables,
    title: &str,
) -> Result<String, WatchError> {
    match fetch_revision_content(client, tunables, title).await {
        Ok(Some(content)) => return Ok(content),
        Ok(None) => debug!(title, "no revision content; falling back to parsed text"),
        Err(err) => debug!(title, error = %err, "revision fetch failed; falling back to parsed text"),
    }

    match fetch_parsed_content(client, tunables, title).await? {
        Some(content) => Ok(content),
        None => Ok(String::new()),
    }
}

async fn fetch_revision_content(
    client: &Client,
    tunables: &Tunables,
    title: &str,
) -> Result<Option<String>, WatchError> {
    let params = [
        ("action", "query"),
        ("format", "json"),
        ("prop", "revisions"),
        ("titles", title),
        ("rvprop", "content"),
        ("rvslots", "main"),
    ];

    let request = || async {
        client
            .get(&tunables.api_url)
            .query(&params)
            .send()
            .await
    };

    let response = fetch_with_retries("revisions", tunables, request).await?;
    if !response.status().is_success() {
        return Ok(None);
    }

    let payload: RevisionsResponse = response.json().await?;
    Ok(payload.first_slot_content())
}

async fn fetch_parsed_content(
    client: &Client,
    tunables: &Tunables,
    title: &str,
) -> Result<Option<String>, WatchError> {
    let params = [
        ("action", "parse"),
        ("format", "json"),
        ("page", title),
        ("prop", "text"),
    ];

    let request = || async {
        client
            .get(&tunables.api_url)
            .query(&params)
            .send()
            .await
    };

    let response = fetch_with_retries("parse", tunables, request).await?;
    if !response.status().is_success() {
        return Ok(None);
    }

    let payload: ParseResponse = response.json().await?;
    let text = payload
        .parse
        .and_then(|parse| parse.text)
        .and_then(|text| text.content)
        .map(|html| strip_markup(&html))
        .filter(|content| !content.trim().is_empty());

    Ok(text)
}

async fn fetch_with_retries<F, Fut>(
    label: &str,
    tunables: &Tunables,
    mut op: F,
) -> Result<reqwest::Response, WatchError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<reqwest::Response, reqwest::Error>>,
{
    let max = tunables.max_retries.max(1);
    let backoff = Duration::from_millis(tunables.retry_backoff_ms);
    let mut attempt = 0usize;

    loop {
        match op().await {
            Ok(response) => return Ok(response),
            Err(err) => {
                attempt += 1;
                let should_retry = match err.status() {
                    Some(status) => {
                        status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
                    }
                    None => err.is_timeout() || err.is_connect() || err.is_request(),
                };

                if attempt >= max || !should_retry {
                    return Err(WatchError::Message(format!(
                        "{} request failed after {} attempts: {}",
                        label, attempt, err
                    )));
                }

                sleep(backoff).await;
            }
        }
    }
}

/// Reduce rendered page HTML to plain text: drop tags, decode the common
/// entities MediaWiki emits.
fn strip_markup(html: &str) -> String {
    let tags = Regex::new(r"<[^>]+>").unwrap();
    let stripped = tags.replace_all(html, "");
    decode_entities(&stripped)
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

#[derive(Debug, Deserialize)]
struct CategoryResponse {
    #[serde(default)]
    query: Option<CategoryQuery>,
}

#[derive(Debug, Deserialize)]
struct CategoryQuery {
    #[serde(default)]
    categorymembers: Vec<CategoryMember>,
}

#[derive(Debug, Deserialize)]
struct CategoryMember {
    title: String,
}

#[derive(Debug, Deserialize)]
struct RevisionsResponse {
    #[serde(default)]
    query: Option<RevisionsQuery>,
}

impl RevisionsResponse {
    fn first_slot_content(self) -> Option<String> {
        let pages = self.query?.pages;
        let page = pages.into_values().next()?;
        let revision = page.revisions.into_iter().next()?;
        revision
            .slots?
            .main?
            .content
            .filter(|content| !content.trim().is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct RevisionsQuery {
    #[serde(default)]
    pages: HashMap<String, RevisionPage>,
}

#[derive(Debug, Deserialize)]
struct RevisionPage {
    #[serde(default)]
    revisions: Vec<Revision>,
}

#[derive(Debug, Deserialize)]
struct Revision {
    #[serde(default)]
    slots: Option<RevisionSlots>,
}

#[derive(Debug, Deserialize)]
struct RevisionSlots {
    #[serde(default)]
    main: Option<SlotContent>,
}

#[derive(Debug, Deserialize)]
struct SlotContent {
    #[serde(rename = "*")]
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ParseResponse {
    #[serde(default)]
    parse: Option<ParsePayload>,
}

#[derive(Debug, Deserialize)]
struct ParsePayload {
    #[serde(default)]
    text: Option<ParseText>,
}

#[derive(Debug, Deserialize)]
struct ParseText {
    #[serde(rename = "*")]
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_payload_deserializes() {
        let raw = r#"{
            "batchcomplete": "",
            "query": {
                "categorymembers": [
                    {"pageid": 101, "ns": 0, "title": "Bountiful Crescendo/2025-09-11"},
                    {"pageid": 102, "ns": 0, "title": "Pioneer Podcast"}
                ]
            }
        }"#;

        let payload: CategoryResponse = serde_json::from_str(raw).expect("valid payload");
        let members = payload.query.unwrap().categorymembers;
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].title, "Bountiful Crescendo/2025-09-11");
    }

    #[test]
    fn category_payload_without_query_is_empty() {
        let payload: CategoryResponse =
            serde_json::from_str(r#"{"batchcomplete": ""}"#).expect("valid payload");
        assert!(payload.query.is_none());
    }

    #[test]
    fn revisions_payload_yields_slot_content() {
        let raw = r#"{
            "query": {
                "pages": {
                    "101": {
                        "pageid": 101,
                        "title": "Bountiful Crescendo/2025-09-11",
                        "revisions": [
                            {"slots": {"main": {"*": "{{Event|time_start=2025-09-11}}"}}}
                        ]
                    }
                }
            }
        }"#;

        let payload: RevisionsResponse = serde_json::from_str(raw).expect("valid payload");
        assert_eq!(
            payload.first_slot_content().as_deref(),
            Some("{{Event|time_start=2025-09-11}}")
        );
    }

    #[test]
    fn missing_page_yields_no_content() {
        let raw = r#"{
            "query": {
                "pages": {
                    "-1": {"ns": 0, "title": "Nonexistent", "missing": ""}
                }
            }
        }"#;

        let payload: RevisionsResponse = serde_json::from_str(raw).expect("valid payload");
        assert_eq!(payload.first_slot_content(), None);
    }

    #[test]
    fn parse_payload_strips_markup() {
        let raw = r#"{
            "parse": {
                "title": "Pioneer Podcast",
                "text": {"*": "<div class=\"mw-parser-output\"><p>time_start = 2025-09-11 &amp; more</p></div>"}
            }
        }"#;

        let payload: ParseResponse = serde_json::from_str(raw).expect("valid payload");
        let text = payload
            .parse
            .unwrap()
            .text
            .unwrap()
            .content
            .map(|html| strip_markup(&html))
            .unwrap();
        assert_eq!(text, "time_start = 2025-09-11 & more");
    }

    #[test]
    fn entity_decoding_covers_common_cases() {
        assert_eq!(
            decode_entities("a &lt;b&gt; &quot;c&quot; &#39;d&#39;&nbsp;&amp; e"),
            "a <b> \"c\" 'd' & e"
        );
    }
}
