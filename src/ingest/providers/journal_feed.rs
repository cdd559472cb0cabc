use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use metrics::{counter, histogram};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::time::Duration;
use time::format_description::well_known::{Rfc2822, Rfc3339};
use time::OffsetDateTime;

use crate::ingest::config::Journal;
use crate::ingest::normalize_text;
use crate::ingest::types::{FeedProvider, Post};

// Ordered field-name candidates, matched on the element's local name
// (so `content:encoded` is `encoded`, `dc:date` is `date`, `prism:url` is `url`).
const TITLE_FIELDS: &[&str] = &["title"];
const SUMMARY_FIELDS: &[&str] = &["encoded", "description", "summary", "content"];
const LINK_FIELDS: &[&str] = &["link", "url", "identifier"];
const PUBLISHED_FIELDS: &[&str] = &["updated", "date", "pubDate", "published"];

/// Child elements of one `<item>`/`<entry>`, first occurrence of each name wins.
#[derive(Debug, Default)]
struct RawEntry {
    fields: HashMap<String, String>,
}

impl RawEntry {
    fn record(&mut self, name: String, value: String) {
        let value = value.trim().to_string();
        if !value.is_empty() {
            self.fields.entry(name).or_insert(value);
        }
    }

    fn first_of(&self, candidates: &[&str]) -> Option<&str> {
        candidates
            .iter()
            .find_map(|k| self.fields.get(*k).map(String::as_str))
    }

    fn first_timestamp(&self) -> Option<DateTime<Utc>> {
        PUBLISHED_FIELDS
            .iter()
            .filter_map(|k| self.fields.get(*k))
            .find_map(|v| parse_timestamp(v))
    }

    /// `None` when the entry lacks a title, link or usable timestamp.
    fn into_post(self, source: &str) -> Option<Post> {
        let title = normalize_text(self.first_of(TITLE_FIELDS)?);
        let url = self.first_of(LINK_FIELDS)?.trim().to_string();
        let published = self.first_timestamp()?;
        if title.is_empty() || url.is_empty() {
            return None;
        }
        let summary = self
            .first_of(SUMMARY_FIELDS)
            .map(normalize_text)
            .unwrap_or_default();
        Some(Post {
            title,
            summary,
            url,
            source: source.to_string(),
            published,
        })
    }
}

/// RFC 3339, RFC 2822, or a bare calendar date (midnight UTC).
pub fn parse_timestamp(ts: &str) -> Option<DateTime<Utc>> {
    let ts = ts.trim();
    let unix = OffsetDateTime::parse(ts, &Rfc3339)
        .or_else(|_| OffsetDateTime::parse(ts, &Rfc2822))
        .ok()
        .map(|dt| dt.unix_timestamp());
    if let Some(secs) = unix {
        return DateTime::<Utc>::from_timestamp(secs, 0);
    }
    NaiveDate::parse_from_str(ts, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

fn local_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

fn href_of(e: &BytesStart<'_>) -> Option<String> {
    let rel = e
        .try_get_attribute("rel")
        .ok()
        .flatten()
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()));
    if rel.as_deref().is_some_and(|r| r != "alternate") {
        return None;
    }
    e.try_get_attribute("href")
        .ok()
        .flatten()
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// Collect the raw entries of an RSS 2.0, RSS 1.0 (RDF) or Atom document.
fn collect_entries(xml: &str) -> Result<Vec<RawEntry>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut entries = Vec::new();
    let mut current: Option<RawEntry> = None;
    let mut field: Option<String> = None;
    let mut depth = 0usize;
    let mut text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = local_name(&e);
                if let Some(entry) = current.as_mut() {
                    depth += 1;
                    if depth == 1 {
                        if name == "link" {
                            if let Some(href) = href_of(&e) {
                                entry.record(name.clone(), href);
                            }
                        }
                        field = Some(name);
                        text.clear();
                    }
                } else if name == "item" || name == "entry" {
                    current = Some(RawEntry::default());
                    depth = 0;
                }
            }
            Ok(Event::Empty(e)) => {
                if let Some(entry) = current.as_mut() {
                    let name = local_name(&e);
                    if depth == 0 && name == "link" {
                        if let Some(href) = href_of(&e) {
                            entry.record(name, href);
                        }
                    }
                }
            }
            Ok(Event::Text(t)) => {
                if current.is_some() && depth >= 1 {
                    let chunk = t
                        .unescape()
                        .map(|c| c.into_owned())
                        .unwrap_or_else(|_| String::from_utf8_lossy(&t).into_owned());
                    if !text.is_empty() {
                        text.push(' ');
                    }
                    text.push_str(&chunk);
                }
            }
            Ok(Event::CData(c)) => {
                if current.is_some() && depth >= 1 {
                    if !text.is_empty() {
                        text.push(' ');
                    }
                    text.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Ok(Event::End(_)) if current.is_some() => {
                if depth == 0 {
                    entries.extend(current.take());
                } else {
                    if depth == 1 {
                        if let (Some(entry), Some(name)) = (current.as_mut(), field.take()) {
                            entry.record(name, std::mem::take(&mut text));
                        }
                    }
                    depth -= 1;
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(anyhow!(
                    "feed xml error at byte {}: {e}",
                    reader.buffer_position()
                ))
            }
            _ => {}
        }
    }
    Ok(entries)
}

pub struct JournalFeed {
    journal: String,
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http { url: String, client: reqwest::Client },
}

impl JournalFeed {
    pub fn from_fixture_str(journal: &str, xml: &str) -> Self {
        Self {
            journal: journal.to_string(),
            mode: Mode::Fixture(xml.to_string()),
        }
    }

    pub fn from_journal(journal: &Journal, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("limnopapers/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("building feed http client")?;
        Ok(Self {
            journal: journal.title.clone(),
            mode: Mode::Http {
                url: journal.rawrss.clone(),
                client,
            },
        })
    }

    pub fn parse_posts_from_str(&self, xml: &str) -> Result<Vec<Post>> {
        let t0 = std::time::Instant::now();
        let entries = collect_entries(xml)
            .with_context(|| format!("parsing feed for {}", self.journal))?;

        let mut out = Vec::with_capacity(entries.len());
        let mut skipped = 0u64;
        for raw in entries {
            match raw.into_post(&self.journal) {
                Some(p) => out.push(p),
                None => skipped += 1,
            }
        }
        if skipped > 0 {
            tracing::debug!(journal = %self.journal, skipped, "incomplete feed entries skipped");
        }

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("feed_parse_ms").record(ms);
        counter!("feed_entries_total").increment(out.len() as u64);
        counter!("feed_entries_skipped_total").increment(skipped);
        Ok(out)
    }
}

#[async_trait]
impl FeedProvider for JournalFeed {
    async fn fetch_posts(&self) -> Result<Vec<Post>> {
        match &self.mode {
            Mode::Fixture(s) => self.parse_posts_from_str(s),
            Mode::Http { url, client } => {
                let body = client
                    .get(url)
                    .send()
                    .await
                    .and_then(|r| r.error_for_status())
                    .with_context(|| format!("fetching {url}"))?
                    .text()
                    .await
                    .with_context(|| format!("reading body of {url}"))?;
                self.parse_posts_from_str(&body)
            }
        }
    }

    fn name(&self) -> &str {
        &self.journal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RDF: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
         xmlns="http://purl.org/rss/1.0/"
         xmlns:dc="http://purl.org/dc/elements/1.1/"
         xmlns:content="http://purl.org/rss/1.0/modules/content/"
         xmlns:prism="http://prismstandard.org/namespaces/basic/2.0/">
  <channel rdf:about="https://example.org/lo">
    <title>Limnology and Oceanography</title>
    <link>https://example.org/lo</link>
  </channel>
  <item rdf:about="https://doi.org/10.1002/lno.1">
    <title>Nutrient loading in Lake Erie</title>
    <link>https://doi.org/10.1002/lno.1</link>
    <description>Short abstract</description>
    <content:encoded><![CDATA[<p>Full <b>abstract</b> on lakes.</p>]]></content:encoded>
    <dc:date>2024-03-10T06:00:00-05:00</dc:date>
    <prism:url>https://doi.org/10.1002/lno.1</prism:url>
  </item>
  <item rdf:about="https://doi.org/10.1002/lno.2">
    <title>No timestamp here</title>
    <link>https://doi.org/10.1002/lno.2</link>
  </item>
</rdf:RDF>"#;

    #[test]
    fn rdf_entries_resolve_field_candidates() {
        let feed = JournalFeed::from_fixture_str("Limnology and Oceanography", RDF);
        let posts = feed.parse_posts_from_str(RDF).unwrap();
        assert_eq!(posts.len(), 1, "entry without timestamp is skipped");
        let p = &posts[0];
        assert_eq!(p.title, "Nutrient loading in Lake Erie");
        assert_eq!(p.summary, "Full abstract on lakes.");
        assert_eq!(p.url, "https://doi.org/10.1002/lno.1");
        assert_eq!(p.source, "Limnology and Oceanography");
        assert_eq!(p.published.to_rfc3339(), "2024-03-10T11:00:00+00:00");
    }

    #[test]
    fn atom_link_href_and_updated() {
        let atom = r#"<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Inland Waters</title>
  <entry>
    <title>Reservoir &amp; river carbon</title>
    <link rel="alternate" href="https://doi.org/10.1080/iw.9"/>
    <summary>Carbon budgets.</summary>
    <updated>2024-03-09T22:00:00Z</updated>
  </entry>
</feed>"#;
        let feed = JournalFeed::from_fixture_str("Inland Waters", atom);
        let posts = feed.parse_posts_from_str(atom).unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].title, "Reservoir & river carbon");
        assert_eq!(posts[0].url, "https://doi.org/10.1080/iw.9");
        assert_eq!(posts[0].summary, "Carbon budgets.");
    }

    #[test]
    fn timestamps_in_common_shapes() {
        assert!(parse_timestamp("Sun, 10 Mar 2024 09:00:00 +0000").is_some());
        assert!(parse_timestamp("2024-03-10T09:00:00Z").is_some());
        assert_eq!(
            parse_timestamp("2024-03-10").unwrap().to_rfc3339(),
            "2024-03-10T00:00:00+00:00"
        );
        assert!(parse_timestamp("yesterday").is_none());
    }
}
