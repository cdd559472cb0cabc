// src/app.rs
//! One full run: connectivity check, feed retrieval, curation, reporting,
//! and (optionally) posting. The binary is a thin clap wrapper around [`run`].

use anyhow::Result;
use chrono::{Local, Offset};
use std::time::Duration;

use crate::browser::{open_all, SystemBrowser};
use crate::config::AppConfig;
use crate::engine::{Pipeline, RunOutcome};
use crate::history::CsvLogStore;
use crate::ingest::config::{load_journals_default, load_keywords_default};
use crate::ingest::providers::journal_feed::JournalFeed;
use crate::ingest::types::{FeedProvider, Post};
use crate::notify::status::StatusPublisher;
use crate::notify::{format_status, Credentials, Publisher};
use crate::scheduler::{Mode, PostingReport, PostingScheduler, PromptDecider};

/// Switches owned by the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub tweet: bool,
    pub interactive: bool,
    pub browser: bool,
    pub debug: bool,
    pub ignore_all: bool,
}

impl RunOptions {
    /// `None` when this run does not post at all.
    pub fn posting_mode(&self, cap: usize) -> Option<Mode> {
        if self.ignore_all {
            Some(Mode::IgnoreAll)
        } else if self.interactive {
            Some(Mode::Interactive)
        } else if self.tweet {
            Some(Mode::Unattended { cap })
        } else {
            None
        }
    }
}

pub async fn run(opts: RunOptions, cfg: &AppConfig) -> Result<Option<PostingReport>> {
    crate::ingest::ensure_connectivity(
        &cfg.connectivity.probe_url,
        Duration::from_secs(cfg.connectivity.timeout_secs),
    )
    .await?;

    let rules = load_keywords_default(&cfg.keywords_path)?;
    let journals = load_journals_default(&cfg.journals_path)?;
    tracing::info!(
        include = rules.include().len(),
        exclude = rules.exclude().len(),
        journals = journals.len(),
        "configuration loaded"
    );

    let timeout = Duration::from_secs(cfg.fetch.timeout_secs);
    let mut providers: Vec<Box<dyn FeedProvider + Send + Sync>> = Vec::with_capacity(journals.len());
    for j in &journals {
        providers.push(Box::new(JournalFeed::from_journal(j, timeout)?));
    }
    let posts = crate::ingest::collect(&providers).await;

    let mut log = CsvLogStore::open(&cfg.log_path)?;
    let now = Local::now();
    let today = now.date_naive();
    let window = cfg.window_selector(now.offset().fix());

    let outcome = Pipeline::new(&rules, window)
        .restrict_candidates_to_window(cfg.window.restrict_candidates)
        .run(posts, &log, today);

    if opts.debug {
        crate::debug::dump_run(&cfg.debug_dir, &outcome.all, &outcome.candidates)?;
    }

    print_outcome(&outcome);

    if opts.browser {
        open_all(&SystemBrowser, outcome.candidates.iter().map(|p| p.url.as_str()));
    }

    let Some(mode) = opts.posting_mode(cfg.posting.max_posts) else {
        return Ok(None);
    };
    let publisher: Option<Box<dyn Publisher>> = match Credentials::from_env() {
        Some(creds) => Some(Box::new(StatusPublisher::new(creds))),
        None => None,
    };
    let scheduler = PostingScheduler::new(mode, publisher);
    let mut decider = PromptDecider::stdio();
    let mut rng = rand::rng();
    let report = scheduler
        .run(outcome.candidates, &mut log, &mut decider, &mut rng, today)
        .await?;
    Ok(Some(report))
}

fn print_lines(heading: &str, posts: &[Post]) {
    println!("{heading}:\n");
    for p in posts {
        println!("{}\n", format_status(&p.title, &p.source, &p.url));
    }
}

fn print_outcome(outcome: &RunOutcome) {
    if outcome.todays_excluded.is_empty() && outcome.candidates.is_empty() {
        println!("No new papers.");
        return;
    }
    print_lines("Excluded", &outcome.todays_excluded);
    print_lines("Filtered", &outcome.candidates);
}
