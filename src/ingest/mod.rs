// src/ingest/mod.rs
pub mod config;
pub mod providers;
pub mod types;

use crate::ingest::types::{FeedProvider, Post};
use anyhow::{Context, Result};
use metrics::{counter, describe_counter, describe_histogram};
use once_cell::sync::OnceCell;
use std::collections::HashSet;
use std::time::Duration;

/// One-time metrics registration.
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("feed_entries_total", "Entries parsed from journal feeds.");
        describe_counter!(
            "feed_entries_skipped_total",
            "Entries skipped for lacking a title, link or timestamp."
        );
        describe_counter!(
            "feed_provider_errors_total",
            "Journal feed fetch/parse errors."
        );
        describe_counter!(
            "classify_relevant_total",
            "Posts passing the keyword filter."
        );
        describe_counter!(
            "classify_excluded_total",
            "Posts dropped by corroborated exclude keywords."
        );
        describe_counter!(
            "dedup_removed_total",
            "Candidates removed because the log already holds their title."
        );
        describe_counter!("posts_published_total", "Statuses published.");
        describe_counter!("posts_logged_total", "Entries appended to the posting log.");
        describe_histogram!("feed_parse_ms", "Feed parse time in milliseconds.");
    });
}

/// Normalize feed text: decode entities, strip tags, collapse whitespace.
/// Trailing punctuation is kept, a title's `?` matters downstream.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").expect("tag regex"));
    out = re_tags.replace_all(&out, " ").to_string();

    // 3) Normalize curly quotes to ASCII
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").expect("whitespace regex"));
    out = re_ws.replace_all(&out, " ").to_string();
    out.trim().to_string()
}

/// Sort by publication time and keep the first post of every repeated title.
pub fn sort_and_drop_repeats(mut posts: Vec<Post>) -> (Vec<Post>, usize) {
    posts.sort_by_key(|p| p.published);
    let mut seen: HashSet<String> = HashSet::new();
    let mut keep = Vec::with_capacity(posts.len());
    let mut repeats = 0usize;
    for p in posts {
        if !seen.insert(p.title.clone()) {
            repeats += 1;
            continue;
        }
        keep.push(p);
    }
    (keep, repeats)
}

/// Fetch every provider once, in order. A failing provider is logged and skipped.
pub async fn collect(providers: &[Box<dyn FeedProvider + Send + Sync>]) -> Vec<Post> {
    ensure_metrics_described();

    let mut raw = Vec::new();
    for p in providers {
        tracing::info!(target: "ingest", journal = p.name(), "fetching papers");
        match p.fetch_posts().await {
            Ok(mut v) => raw.append(&mut v),
            Err(e) => {
                tracing::warn!(error = ?e, journal = p.name(), "feed error");
                counter!("feed_provider_errors_total").increment(1);
            }
        }
    }

    let (posts, repeats) = sort_and_drop_repeats(raw);
    tracing::info!(
        target: "ingest",
        kept = posts.len(),
        repeats = repeats,
        "feeds collected"
    );
    posts
}

/// Single reachability probe performed before any feed is attempted.
pub async fn ensure_connectivity(probe_url: &str, timeout: Duration) -> Result<()> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .context("building connectivity probe client")?;
    if let Err(e) = client.head(probe_url).send().await {
        tracing::debug!(error = ?e, probe_url, "connectivity probe failed");
        anyhow::bail!("limnopapers requires an internet connection (probe {probe_url} failed)");
    }
    Ok(())
}
