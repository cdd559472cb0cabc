// src/dedup.rs
//! Removal of papers whose title is already in the posting log.
//!
//! Titles are compared case-insensitively after the same shortening that is
//! applied before a title is logged, so a logged (shortened) title still
//! matches the full title of the same paper. Three passes run in order:
//! exact, with a trailing `.`, with a trailing `?`. When revalidation is
//! requested the survivors are re-classified after every pass.

use crate::history::LogStore;
use crate::ingest::types::Post;
use crate::relevance::{classify, KeywordRuleSet};

/// Titles longer than this are shortened before logging.
pub const MAX_TITLE_CHARS: usize = 159;
pub const ELLIPSIS: &str = "...";

/// Shortened display form, as written to the log.
pub fn log_title(title: &str) -> String {
    if title.chars().count() > MAX_TITLE_CHARS {
        let mut out: String = title.chars().take(MAX_TITLE_CHARS).collect();
        out.push_str(ELLIPSIS);
        out
    } else {
        title.to_string()
    }
}

/// Comparison form: shortened and case-folded. Never displayed.
pub fn normalize_title(title: &str) -> String {
    log_title(title).to_lowercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    Exact,
    TrailingPeriod,
    TrailingQuestionMark,
}

pub const PASSES: [Pass; 3] = [Pass::Exact, Pass::TrailingPeriod, Pass::TrailingQuestionMark];

impl Pass {
    pub fn key(self, normalized: &str) -> String {
        match self {
            Pass::Exact => normalized.to_string(),
            Pass::TrailingPeriod => format!("{normalized}."),
            Pass::TrailingQuestionMark => format!("{normalized}?"),
        }
    }
}

/// True when any pass finds the title in the log.
pub fn is_logged<L: LogStore + ?Sized>(log: &L, title: &str) -> bool {
    let normalized = normalize_title(title);
    PASSES.iter().any(|p| log.contains_key(&p.key(&normalized)))
}

/// Posts whose normalized title (bare, `.`-suffixed or `?`-suffixed) is not logged.
pub fn dedupe<L: LogStore + ?Sized>(posts: Vec<Post>, log: &L) -> Vec<Post> {
    dedupe_with(posts, log, |survivors| survivors)
}

/// Like [`dedupe`], re-applying the classifier after each subtractive pass.
pub fn dedupe_revalidated<L: LogStore + ?Sized>(
    posts: Vec<Post>,
    log: &L,
    rules: &KeywordRuleSet,
) -> Vec<Post> {
    dedupe_with(posts, log, |survivors| classify(survivors, rules).relevant)
}

fn dedupe_with<L, F>(posts: Vec<Post>, log: &L, revalidate: F) -> Vec<Post>
where
    L: LogStore + ?Sized,
    F: Fn(Vec<Post>) -> Vec<Post>,
{
    let mut survivors = posts;
    for pass in PASSES {
        survivors.retain(|p| !log.contains_key(&pass.key(&normalize_title(&p.title))));
        survivors = revalidate(survivors);
    }
    survivors
}
