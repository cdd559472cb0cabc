//! # Curation Engine
//! Pure, testable pipeline that maps `(posts, rules, log, anchor date)` to the
//! novel relevant candidates of a run. No network, no writes.
//!
//! Order: classify everything, dedupe the relevant set against the log
//! (re-classifying after each pass), then build the "excluded today" report
//! from the window around the anchor.

use chrono::NaiveDate;
use metrics::counter;
use std::collections::HashSet;

use crate::dedup::dedupe_revalidated;
use crate::history::LogStore;
use crate::ingest::ensure_metrics_described;
use crate::ingest::types::Post;
use crate::relevance::{classify, ClassificationResult, KeywordRuleSet};
use crate::window::WindowSelector;

#[derive(Debug, Clone, Default)]
pub struct RunOutcome {
    /// Everything ingested, sorted by publication time.
    pub all: Vec<Post>,
    pub classification: ClassificationResult,
    /// Relevant posts not yet in the log.
    pub candidates: Vec<Post>,
    /// Posts inside the window that did not become candidates.
    pub todays_excluded: Vec<Post>,
}

pub struct Pipeline<'a> {
    rules: &'a KeywordRuleSet,
    window: WindowSelector,
    restrict_candidates: bool,
}

impl<'a> Pipeline<'a> {
    pub fn new(rules: &'a KeywordRuleSet, window: WindowSelector) -> Self {
        Self {
            rules,
            window,
            restrict_candidates: false,
        }
    }

    /// Also drop candidates published outside the window.
    pub fn restrict_candidates_to_window(mut self, on: bool) -> Self {
        self.restrict_candidates = on;
        self
    }

    pub fn run<L: LogStore + ?Sized>(&self, posts: Vec<Post>, log: &L, anchor: NaiveDate) -> RunOutcome {
        ensure_metrics_described();

        let classification = classify(posts.clone(), self.rules);
        for ex in &classification.excluded {
            tracing::debug!(
                target: "relevance",
                title = %ex.post.title,
                keyword = %ex.keyword,
                "excluded by keyword"
            );
        }
        counter!("classify_relevant_total").increment(classification.relevant.len() as u64);
        counter!("classify_excluded_total").increment(classification.excluded.len() as u64);

        let relevant = classification.relevant.clone();
        let before = relevant.len();
        let mut candidates = dedupe_revalidated(relevant, log, self.rules);
        let already_logged = before - candidates.len();
        counter!("dedup_removed_total").increment(already_logged as u64);

        if self.restrict_candidates {
            candidates = self.window.select_window(&candidates, anchor);
        }

        let candidate_titles: HashSet<&str> = candidates.iter().map(|p| p.title.as_str()).collect();
        let todays_excluded: Vec<Post> = self
            .window
            .select_window(&posts, anchor)
            .into_iter()
            .filter(|p| !candidate_titles.contains(p.title.as_str()))
            .collect();

        tracing::info!(
            target: "pipeline",
            ingested = posts.len(),
            relevant = classification.relevant.len(),
            excluded = classification.excluded.len(),
            already_logged,
            candidates = candidates.len(),
            todays_excluded = todays_excluded.len(),
            "run classified"
        );

        RunOutcome {
            all: posts,
            classification,
            candidates,
            todays_excluded,
        }
    }
}
