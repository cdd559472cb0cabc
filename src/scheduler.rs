// src/scheduler.rs
//! Chooses which novel candidates get announced, and records the outcome.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;
use std::io::{BufRead, Write};

use crate::dedup::{is_logged, log_title, normalize_title};
use crate::history::{LogEntry, LogStore, Posted};
use crate::ingest::types::Post;
use crate::notify::{format_status, Publisher};

pub const DEFAULT_MAX_POSTS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Post,
    Skip,
    IgnoreButLog,
}

/// Asked once per candidate in interactive mode.
pub trait Decider {
    fn decide(&mut self, status: &str) -> Result<Decision>;
}

/// Reads `y` / `n` / `i` answers; an empty answer means `y`.
pub struct PromptDecider<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptDecider<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl PromptDecider<std::io::StdinLock<'static>, std::io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stdout())
    }
}

impl<R: BufRead, W: Write> Decider for PromptDecider<R, W> {
    fn decide(&mut self, status: &str) -> Result<Decision> {
        writeln!(self.output, "{status}")?;
        write!(self.output, "post limnotoot (y)/n/i? ")?;
        self.output.flush()?;

        let mut line = String::new();
        let n = self.input.read_line(&mut line).context("reading answer")?;
        if n == 0 {
            return Ok(Decision::Skip);
        }
        Ok(match line.trim().to_ascii_lowercase().as_str() {
            "" | "y" => Decision::Post,
            "i" => Decision::IgnoreButLog,
            "n" => Decision::Skip,
            other => {
                tracing::warn!(answer = other, "unrecognised answer, skipping");
                Decision::Skip
            }
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Post without asking, at most `cap` per run.
    Unattended { cap: usize },
    /// Ask for every candidate, no cap.
    Interactive,
    /// Log every candidate as ignored without posting (history backfill).
    IgnoreAll,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PostingReport {
    pub posted: Vec<String>,
    pub ignored: Vec<String>,
    pub skipped: usize,
    pub failed: usize,
    /// No publisher was available for a mode that posts.
    pub disabled: bool,
}

pub struct PostingScheduler {
    mode: Mode,
    publisher: Option<Box<dyn Publisher>>,
}

impl PostingScheduler {
    pub fn new(mode: Mode, publisher: Option<Box<dyn Publisher>>) -> Self {
        Self { mode, publisher }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Uniform random permutation of the candidates.
    pub fn shuffle<R: Rng + ?Sized>(mut candidates: Vec<Post>, rng: &mut R) -> Vec<Post> {
        candidates.shuffle(rng);
        candidates
    }

    pub async fn run<L, R>(
        &self,
        candidates: Vec<Post>,
        log: &mut L,
        decider: &mut dyn Decider,
        rng: &mut R,
        today: NaiveDate,
    ) -> Result<PostingReport>
    where
        L: LogStore + ?Sized,
        R: Rng + ?Sized,
    {
        let mut report = PostingReport::default();

        let publisher = match (&self.publisher, self.mode) {
            (Some(p), _) => Some(p.as_ref()),
            (None, Mode::IgnoreAll) => None,
            (None, _) => {
                tracing::warn!(
                    target: "posting",
                    candidates = candidates.len(),
                    "no posting credentials, posting disabled"
                );
                report.disabled = true;
                return Ok(report);
            }
        };

        let mut offered: HashSet<String> = HashSet::new();
        for post in Self::shuffle(candidates, rng) {
            if !offered.insert(normalize_title(&post.title)) || is_logged(&*log, &post.title) {
                continue;
            }
            let status = format_status(&post.title, &post.source, &post.url);

            let decision = match self.mode {
                Mode::IgnoreAll => Decision::IgnoreButLog,
                Mode::Interactive => decider.decide(&status)?,
                Mode::Unattended { cap } => {
                    if report.posted.len() >= cap {
                        break;
                    }
                    Decision::Post
                }
            };

            match decision {
                Decision::Skip => report.skipped += 1,
                Decision::IgnoreButLog => {
                    log.append(entry_for(&post, Posted::Ignored, today))?;
                    report.ignored.push(post.title);
                }
                Decision::Post => {
                    let Some(p) = publisher else {
                        report.skipped += 1;
                        continue;
                    };
                    match p.publish(&status).await {
                        Ok(()) => {
                            tracing::info!(target: "posting", title = %post.title, "posted");
                            log.append(entry_for(&post, Posted::Yes, today))?;
                            report.posted.push(post.title);
                        }
                        Err(e) => {
                            tracing::warn!(target: "posting", error = ?e, title = %post.title, "post failed");
                            report.failed += 1;
                        }
                    }
                }
            }
        }

        tracing::info!(
            target: "posting",
            posted = report.posted.len(),
            ignored = report.ignored.len(),
            skipped = report.skipped,
            failed = report.failed,
            "posting finished"
        );
        Ok(report)
    }
}

fn entry_for(post: &Post, posted: Posted, today: NaiveDate) -> LogEntry {
    LogEntry {
        title: log_title(&post.title),
        source: post.source.clone(),
        url: post.url.clone(),
        posted,
        date: Some(today),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn prompt_answers() {
        let input = Cursor::new("\nn\ni\nmaybe\n");
        let mut out = Vec::new();
        let mut d = PromptDecider::new(input, &mut out);
        assert_eq!(d.decide("a").unwrap(), Decision::Post);
        assert_eq!(d.decide("b").unwrap(), Decision::Skip);
        assert_eq!(d.decide("c").unwrap(), Decision::IgnoreButLog);
        assert_eq!(d.decide("d").unwrap(), Decision::Skip);
        assert_eq!(d.decide("eof").unwrap(), Decision::Skip);
        let shown = String::from_utf8(out).unwrap();
        assert!(shown.contains("post limnotoot (y)/n/i? "));
    }
}
