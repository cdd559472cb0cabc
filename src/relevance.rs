// src/relevance.rs
//! Keyword relevance gate.
//!
//! A post is relevant when an include keyword occurs in its title or summary
//! and no exclude keyword occurs in *both* fields. An exclude hit in only one
//! field is not enough to drop a candidate. Matching is case-insensitive
//! substring matching. Pure: no I/O, no logging.

use crate::ingest::types::Post;

/// Include/exclude keyword lists, loaded once per run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordRuleSet {
    include: Vec<String>,
    exclude: Vec<String>,
    include_lc: Vec<String>,
    exclude_lc: Vec<String>,
}

impl KeywordRuleSet {
    /// Blank keywords are dropped; they would match every post.
    pub fn new(include: Vec<String>, exclude: Vec<String>) -> Self {
        let keep = |v: Vec<String>| -> Vec<String> {
            v.into_iter().filter(|k| !k.trim().is_empty()).collect()
        };
        let lower = |v: &[String]| -> Vec<String> { v.iter().map(|k| k.to_lowercase()).collect() };
        let include = keep(include);
        let exclude = keep(exclude);
        Self {
            include_lc: lower(&include),
            exclude_lc: lower(&exclude),
            include,
            exclude,
        }
    }

    pub fn include(&self) -> &[String] {
        &self.include
    }

    pub fn exclude(&self) -> &[String] {
        &self.exclude
    }

    /// First include keyword found in title or summary.
    pub fn include_hit(&self, post: &Post) -> Option<&str> {
        let title = post.title.to_lowercase();
        let summary = post.summary.to_lowercase();
        self.include_lc
            .iter()
            .position(|k| title.contains(k.as_str()) || summary.contains(k.as_str()))
            .map(|i| self.include[i].as_str())
    }

    /// First exclude keyword found in title *and* summary.
    pub fn exclude_hit(&self, post: &Post) -> Option<&str> {
        let title = post.title.to_lowercase();
        let summary = post.summary.to_lowercase();
        self.exclude_lc
            .iter()
            .position(|k| title.contains(k.as_str()) && summary.contains(k.as_str()))
            .map(|i| self.exclude[i].as_str())
    }

    pub fn verdict(&self, post: &Post) -> Verdict {
        if self.include_hit(post).is_none() {
            return Verdict::Unmatched;
        }
        match self.exclude_hit(post) {
            Some(k) => Verdict::Excluded {
                keyword: k.to_string(),
            },
            None => Verdict::Relevant,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Relevant,
    /// Matched an include keyword but `keyword` was corroborated in both fields.
    Excluded { keyword: String },
    /// No include keyword at all.
    Unmatched,
}

/// An excluded post with the keyword that caused the exclusion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exclusion {
    pub post: Post,
    pub keyword: String,
}

/// Order-preserving split of a post sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassificationResult {
    pub relevant: Vec<Post>,
    pub excluded: Vec<Exclusion>,
    pub unmatched: Vec<Post>,
}

impl ClassificationResult {
    pub fn excluded_posts(&self) -> impl Iterator<Item = &Post> {
        self.excluded.iter().map(|e| &e.post)
    }
}

pub fn classify(posts: Vec<Post>, rules: &KeywordRuleSet) -> ClassificationResult {
    let mut out = ClassificationResult::default();
    for post in posts {
        match rules.verdict(&post) {
            Verdict::Relevant => out.relevant.push(post),
            Verdict::Excluded { keyword } => out.excluded.push(Exclusion { post, keyword }),
            Verdict::Unmatched => out.unmatched.push(post),
        }
    }
    out
}
