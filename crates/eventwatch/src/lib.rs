pub mod config;
pub mod error;
pub mod fetch;
pub mod logging;
pub mod render;

use futures_util::StreamExt;
use futures_util::stream;
use reqwest::Client;
use tracing::{debug, info, warn};

use config::{AppConfig, CliArgs};
use error::WatchError;
use eventwatch_core::{RawEvent, resolve_all};
use fetch::{fetch_category_members, fetch_page_content};

pub async fn run(cli: CliArgs) -> Result<(), WatchError> {
    let AppConfig {
        tunables,
        now,
        json,
        verbose,
    } = cli.resolve()?;

    logging::init_logging(verbose)?;

    let client = Client::builder()
        .user_agent("eventwatch/0.1")
        .build()?;

    let members = fetch_category_members(&client, &tunables).await?;
    info!(
        count = members.len(),
        category = %tunables.category,
        "fetched category members"
    );

    // `buffered` (not `buffer_unordered`) keeps completion in submission
    // order; ranking tie-breaks rely on fetch order.
    let raw_events: Vec<RawEvent> = stream::iter(members.into_iter().map(|page| {
        let client = client.clone();
        let tunables = tunables.clone();
        async move {
            let wikitext = match fetch_page_content(&client, &tunables, &page.title).await {
                Ok(body) => body,
                Err(err) => {
                    warn!(title = %page.title, error = %err, "page fetch failed; treating as empty");
                    String::new()
                }
            };
            RawEvent {
                title: page.title,
                wikitext,
            }
        }
    }))
    .buffered(tunables.fetch_concurrency.max(1))
    .collect()
    .await;

    let ongoing = resolve_all(&raw_events, now);
    debug!(
        examined = raw_events.len(),
        ongoing = ongoing.len(),
        "resolution complete"
    );

    if json {
        println!("{}", render::render_json(&ongoing)?);
    } else {
        print!("{}", render::render_text(&ongoing, &tunables.category, now));
    }

    Ok(())
}
