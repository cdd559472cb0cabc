//! history.rs: append-only posting log.
//!
//! Every title that was posted or deliberately ignored is recorded once and
//! suppresses the same paper on every later run. Entries are never edited or
//! removed. One writer per log: concurrent runs against the same file are
//! not supported and must be prevented by the caller.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Posted {
    #[serde(rename = "y")]
    Yes,
    #[serde(rename = "i")]
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub title: String,
    pub source: String,
    pub url: String,
    pub posted: Posted,
    pub date: Option<NaiveDate>, // absent on legacy rows
}

/// On-disk row. Blank seed rows and legacy rows without `posted`/`date` still parse.
#[derive(Debug, Default, Serialize, Deserialize)]
struct LogRecord {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    dc_source: Option<String>,
    #[serde(default)]
    prism_url: Option<String>,
    #[serde(default)]
    posted: Option<Posted>,
    #[serde(default)]
    date: Option<NaiveDate>,
}

impl LogRecord {
    fn into_entry(self) -> Option<LogEntry> {
        let title = self.title.filter(|t| !t.trim().is_empty())?;
        Some(LogEntry {
            title,
            source: self.dc_source.unwrap_or_default(),
            url: self.prism_url.unwrap_or_default(),
            // rows written by unattended runs never carried a flag
            posted: self.posted.unwrap_or(Posted::Yes),
            date: self.date,
        })
    }
}

impl From<&LogEntry> for LogRecord {
    fn from(e: &LogEntry) -> Self {
        Self {
            title: Some(e.title.clone()),
            dc_source: Some(e.source.clone()),
            prism_url: Some(e.url.clone()),
            posted: Some(e.posted),
            date: e.date,
        }
    }
}

/// Lookup key of a logged title.
pub fn log_key(title: &str) -> String {
    title.to_lowercase()
}

/// Append-only store keyed by lower-cased title.
pub trait LogStore {
    fn entries(&self) -> &[LogEntry];
    /// Exact match of an already lower-cased title.
    fn contains_key(&self, key: &str) -> bool;
    fn append(&mut self, entry: LogEntry) -> Result<()>;

    fn contains(&self, title: &str) -> bool {
        self.contains_key(&log_key(title))
    }
}

#[derive(Debug, Default)]
pub struct MemoryLogStore {
    entries: Vec<LogEntry>,
    keys: HashSet<String>,
}

impl MemoryLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<LogEntry>) -> Self {
        let keys = entries.iter().map(|e| log_key(&e.title)).collect();
        Self { entries, keys }
    }
}

impl LogStore for MemoryLogStore {
    fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    fn contains_key(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    fn append(&mut self, entry: LogEntry) -> Result<()> {
        self.keys.insert(log_key(&entry.title));
        self.entries.push(entry);
        Ok(())
    }
}

/// CSV file with columns `title,dc_source,prism_url,posted,date`.
#[derive(Debug)]
pub struct CsvLogStore {
    path: PathBuf,
    mem: MemoryLogStore,
}

impl CsvLogStore {
    /// Read the whole log. A missing file is an empty history.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            tracing::info!(target: "history", path = %path.display(), "no log yet, starting empty");
            return Ok(Self {
                path,
                mem: MemoryLogStore::new(),
            });
        }

        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&path)
            .with_context(|| format!("opening log {}", path.display()))?;
        let mut entries = Vec::new();
        for (i, row) in rdr.deserialize::<LogRecord>().enumerate() {
            let rec = row.with_context(|| format!("log {} row {}", path.display(), i + 2))?;
            entries.extend(rec.into_entry());
        }
        tracing::info!(target: "history", entries = entries.len(), "log loaded");
        Ok(Self {
            path,
            mem: MemoryLogStore::from_entries(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// First write creates the file with its header and one blank seed row.
    fn create_with_seed(&self) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        }
        let mut w = csv::Writer::from_path(&self.path)
            .with_context(|| format!("creating log {}", self.path.display()))?;
        w.serialize(LogRecord::default())?;
        w.flush()?;
        Ok(())
    }
}

impl LogStore for CsvLogStore {
    fn entries(&self) -> &[LogEntry] {
        self.mem.entries()
    }

    fn contains_key(&self, key: &str) -> bool {
        self.mem.contains_key(key)
    }

    fn append(&mut self, entry: LogEntry) -> Result<()> {
        if !self.path.exists() {
            self.create_with_seed()?;
        }
        let file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .with_context(|| format!("opening log {} for append", self.path.display()))?;
        let mut w = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        w.serialize(LogRecord::from(&entry))?;
        w.flush()?;
        metrics::counter!("posts_logged_total").increment(1);
        self.mem.append(entry)
    }
}
