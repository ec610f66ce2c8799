use std::env;

use chrono::{DateTime, Utc};
use clap::{ArgAction, Parser};

use crate::error::WatchError;
use eventwatch_core::parse_date;

pub const DEFAULT_CATEGORY: &str = "Events";
pub const DEFAULT_FETCH_LIMIT: u32 = 50;

/// CLI surface for the event watcher.
#[derive(Debug, Parser, Clone)]
#[command(author, version, about = "List ongoing events from a MediaWiki fan wiki")]
pub struct CliArgs {
    /// MediaWiki api.php endpoint, e.g. https://wutheringwaves.fandom.com/api.php
    #[arg(long = "api-url", value_name = "URL")]
    pub api_url: Option<String>,

    /// Category whose members are the candidate event pages.
    #[arg(long = "category", value_name = "NAME")]
    pub category: Option<String>,

    /// Maximum number of category members to examine.
    #[arg(long = "limit", value_name = "COUNT")]
    pub limit: Option<u32>,

    /// Reference instant override, "YYYY-MM-DD" or "YYYY-MM-DD HH:MM" (UTC).
    #[arg(long = "now", value_name = "WHEN")]
    pub now: Option<String>,

    /// Emit the report as JSON instead of text.
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Surface per-page resolution diagnostics on stderr.
    #[arg(long, action = ArgAction::SetTrue)]
    pub verbose: bool,
}

/// Runtime knobs resolved from flags and environment.
#[derive(Debug, Clone)]
pub struct Tunables {
    pub api_url: String,
    pub category: String,
    pub fetch_limit: u32,
    pub max_retries: usize,
    pub retry_backoff_ms: u64,
    pub fetch_concurrency: usize,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub tunables: Tunables,
    pub now: DateTime<Utc>,
    pub json: bool,
    pub verbose: bool,
}

impl CliArgs {
    pub fn resolve(self) -> Result<AppConfig, WatchError> {
        let api_url = match self.api_url.or_else(|| env::var("WIKI_API_URL").ok()) {
            Some(url) if !url.trim().is_empty() => url,
            _ => {
                return Err(WatchError::Config(
                    "no wiki API endpoint; pass --api-url or set WIKI_API_URL".to_string(),
                ));
            }
        };

        let category = self
            .category
            .or_else(|| env::var("EVENT_CATEGORY").ok())
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

        let fetch_limit = match self.limit {
            Some(limit) => limit,
            None => parse_u32_env("EVENT_FETCH_LIMIT", DEFAULT_FETCH_LIMIT)?,
        };

        let max_retries = parse_usize_env("EVENTWATCH_MAX_RETRIES", 3)?;
        let retry_backoff_ms = parse_u64_env("EVENTWATCH_RETRY_BACKOFF_MS", 1_000)?;
        let fetch_concurrency = parse_usize_env("EVENTWATCH_FETCH_CONCURRENCY", 8)?;

        let now = match self.now {
            Some(raw) => parse_now_override(&raw)?,
            None => Utc::now(),
        };

        Ok(AppConfig {
            tunables: Tunables {
                api_url,
                category,
                fetch_limit,
                max_retries,
                retry_backoff_ms,
                fetch_concurrency,
            },
            now,
            json: self.json,
            verbose: self.verbose,
        })
    }
}

/// Parse a `--now` override through the same format table the engine uses
/// for wiki dates, so test runs and wiki content agree on what parses.
pub fn parse_now_override(raw: &str) -> Result<DateTime<Utc>, WatchError> {
    parse_date(raw).ok_or_else(|| {
        WatchError::Config(format!(
            "invalid --now value {raw:?}; expected YYYY-MM-DD or \"YYYY-MM-DD HH:MM\""
        ))
    })
}

fn parse_u32_env(var: &str, default: u32) -> Result<u32, WatchError> {
    parse_env(var, default, |s| s.parse::<u32>())
}

fn parse_u64_env(var: &str, default: u64) -> Result<u64, WatchError> {
    parse_env(var, default, |s| s.parse::<u64>())
}

fn parse_usize_env(var: &str, default: usize) -> Result<usize, WatchError> {
    parse_env(var, default, |s| s.parse::<usize>())
}

fn parse_env<T, F, E>(var: &str, default: T, mut parser: F) -> Result<T, WatchError>
where
    F: FnMut(&str) -> Result<T, E>,
    T: Copy,
    E: std::fmt::Display,
{
    match env::var(var) {
        Ok(value) => match parser(&value) {
            Ok(parsed) => Ok(parsed),
            Err(err) => Err(WatchError::Config(format!(
                "invalid value for {}: {}",
                var, err
            ))),
        },
        Err(_) => Ok(default),
    }
}
