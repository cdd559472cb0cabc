// src/ingest/config.rs
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::relevance::KeywordRuleSet;

const ENV_KEYWORDS_PATH: &str = "LIMNOPAPERS_KEYWORDS_PATH";
const ENV_JOURNALS_PATH: &str = "LIMNOPAPERS_JOURNALS_PATH";

/// A configured journal feed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Journal {
    pub title: String,
    pub rawrss: String,
}

#[derive(Deserialize)]
struct KeywordRow {
    #[serde(default)]
    filter_for: Option<String>,
    #[serde(default)]
    filter_against: Option<String>,
}

/// Load keyword rules from a two-column CSV (`filter_for`, `filter_against`).
/// Columns may differ in length; blank cells are ignored.
pub fn load_keywords_from(path: &Path) -> Result<KeywordRuleSet> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading keywords from {}", path.display()))?;
    parse_keywords(&content).with_context(|| format!("parsing keywords in {}", path.display()))
}

/// Load journals from a two-column CSV (`title`, `rawrss`), shortest name first.
pub fn load_journals_from(path: &Path) -> Result<Vec<Journal>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading journals from {}", path.display()))?;
    parse_journals(&content).with_context(|| format!("parsing journals in {}", path.display()))
}

/// Resolve a config file path:
/// 1) the given env var (must point at an existing file)
/// 2) the configured fallback path
pub fn resolve_path(env_name: &str, fallback: &Path) -> Result<PathBuf> {
    if let Ok(p) = std::env::var(env_name) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return Ok(pb);
        }
        return Err(anyhow!("{env_name} points to non-existent path"));
    }
    Ok(fallback.to_path_buf())
}

pub fn load_keywords_default(fallback: &Path) -> Result<KeywordRuleSet> {
    load_keywords_from(&resolve_path(ENV_KEYWORDS_PATH, fallback)?)
}

pub fn load_journals_default(fallback: &Path) -> Result<Vec<Journal>> {
    load_journals_from(&resolve_path(ENV_JOURNALS_PATH, fallback)?)
}

fn parse_keywords(s: &str) -> Result<KeywordRuleSet> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(s.as_bytes());

    let headers = rdr.headers()?.clone();
    if !headers.iter().any(|h| h == "filter_for") {
        return Err(anyhow!("keyword table lacks a `filter_for` column"));
    }

    let mut include = Vec::new();
    let mut exclude = Vec::new();
    for row in rdr.deserialize::<KeywordRow>() {
        let row = row?;
        include.extend(row.filter_for);
        exclude.extend(row.filter_against);
    }
    Ok(KeywordRuleSet::new(clean_list(include), clean_list(exclude)))
}

fn parse_journals(s: &str) -> Result<Vec<Journal>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(s.as_bytes());

    let mut out = Vec::new();
    for row in rdr.deserialize::<Journal>() {
        let j = row?;
        if j.rawrss.is_empty() {
            tracing::warn!(journal = %j.title, "journal without feed url skipped");
            continue;
        }
        out.push(j);
    }
    out.sort_by_key(|j| j.title.chars().count());
    Ok(out)
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    let mut set = BTreeSet::new();
    for it in items {
        let t = it.trim();
        if !t.is_empty() {
            set.insert(t.to_string());
        }
    }
    set.into_iter().collect()
}
