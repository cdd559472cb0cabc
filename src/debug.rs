//! Intermediate candidate sets dumped to CSV for inspection (`--debug`).

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::ingest::types::Post;

pub const ALL_POSTS_FILE: &str = "posts_all.csv";
pub const RELEVANT_POSTS_FILE: &str = "posts_relevant.csv";

/// Columns: `title,summary,prism_url,dc_source,updated`.
pub fn write_posts_csv(path: &Path, posts: &[Post]) -> Result<()> {
    let mut w = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    if posts.is_empty() {
        w.write_record(["title", "summary", "prism_url", "dc_source", "updated"])?;
    }
    for p in posts {
        w.serialize(p)?;
    }
    w.flush()?;
    Ok(())
}

/// Writes both snapshots into `dir` and returns their paths.
pub fn dump_run(dir: &Path, all: &[Post], relevant: &[Post]) -> Result<(PathBuf, PathBuf)> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let all_path = dir.join(ALL_POSTS_FILE);
    let rel_path = dir.join(RELEVANT_POSTS_FILE);
    write_posts_csv(&all_path, all)?;
    write_posts_csv(&rel_path, relevant)?;
    tracing::info!(
        target: "debug",
        all = %all_path.display(),
        relevant = %rel_path.display(),
        "candidate sets written"
    );
    Ok((all_path, rel_path))
}
