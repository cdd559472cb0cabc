// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod app;
pub mod browser;
pub mod config;
pub mod debug;
pub mod dedup;
pub mod engine;
pub mod history;
pub mod ingest;
pub mod relevance;
pub mod scheduler;
pub mod window;

// Status posting
pub mod notify;

// ---- Re-exports for stable public API ----
pub use crate::dedup::{dedupe, normalize_title};
pub use crate::engine::{Pipeline, RunOutcome};
pub use crate::history::{CsvLogStore, LogEntry, LogStore, MemoryLogStore, Posted};
pub use crate::ingest::types::Post;
pub use crate::relevance::{classify, ClassificationResult, KeywordRuleSet};
pub use crate::scheduler::{Decision, Mode, PostingScheduler};
pub use crate::window::WindowSelector;
