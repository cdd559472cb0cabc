// src/config/app.rs
use anyhow::{anyhow, Context, Result};
use chrono::{Duration, FixedOffset, NaiveTime};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::{env, fs};

use crate::scheduler::DEFAULT_MAX_POSTS;
use crate::window::WindowSelector;

pub const ENV_CONFIG_PATH: &str = "LIMNOPAPERS_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config/limnopapers.toml";

fn default_keywords_path() -> PathBuf {
    PathBuf::from("config/keywords.csv")
}
fn default_journals_path() -> PathBuf {
    PathBuf::from("config/journals.csv")
}
fn default_log_path() -> PathBuf {
    PathBuf::from("log.csv")
}
fn default_debug_dir() -> PathBuf {
    PathBuf::from(".")
}
/// Upper bound for either side of the window (one year).
pub const MAX_WINDOW_HOURS: f64 = 24.0 * 366.0;

fn default_before_hours() -> f64 {
    24.0
}
fn default_after_hours() -> f64 {
    0.0
}
fn default_anchor_time() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN)
}
fn default_max_posts() -> usize {
    DEFAULT_MAX_POSTS
}
fn default_probe_url() -> String {
    "https://onlinelibrary.wiley.com".to_string()
}
fn default_probe_timeout() -> u64 {
    5
}
fn default_fetch_timeout() -> u64 {
    20
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "default_before_hours")]
    pub before_hours: f64,
    #[serde(default = "default_after_hours")]
    pub after_hours: f64,
    /// Local time of day the anchor date is pinned to.
    #[serde(default = "default_anchor_time")]
    pub anchor_time: NaiveTime,
    /// Also require candidates to fall inside the window.
    #[serde(default)]
    pub restrict_candidates: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            before_hours: default_before_hours(),
            after_hours: default_after_hours(),
            anchor_time: default_anchor_time(),
            restrict_candidates: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostingConfig {
    #[serde(default = "default_max_posts")]
    pub max_posts: usize,
}

impl Default for PostingConfig {
    fn default() -> Self {
        Self {
            max_posts: default_max_posts(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectivityConfig {
    #[serde(default = "default_probe_url")]
    pub probe_url: String,
    #[serde(default = "default_probe_timeout")]
    pub timeout_secs: u64,
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            probe_url: default_probe_url(),
            timeout_secs: default_probe_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_fetch_timeout")]
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_fetch_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_keywords_path")]
    pub keywords_path: PathBuf,
    #[serde(default = "default_journals_path")]
    pub journals_path: PathBuf,
    #[serde(default = "default_log_path")]
    pub log_path: PathBuf,
    #[serde(default = "default_debug_dir")]
    pub debug_dir: PathBuf,
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub posting: PostingConfig,
    #[serde(default)]
    pub connectivity: ConnectivityConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            keywords_path: default_keywords_path(),
            journals_path: default_journals_path(),
            log_path: default_log_path(),
            debug_dir: default_debug_dir(),
            window: WindowConfig::default(),
            posting: PostingConfig::default(),
            connectivity: ConnectivityConfig::default(),
            fetch: FetchConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml_str(&data).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let mut cfg: AppConfig = toml::from_str(s)?;

        // Sanitize window
        let hours_ok = |h: f64| h.is_finite() && (0.0..=MAX_WINDOW_HOURS).contains(&h);
        if !hours_ok(cfg.window.before_hours) {
            cfg.window.before_hours = default_before_hours();
        }
        if !hours_ok(cfg.window.after_hours) {
            cfg.window.after_hours = default_after_hours();
        }
        if cfg.connectivity.timeout_secs == 0 {
            cfg.connectivity.timeout_secs = default_probe_timeout();
        }
        if cfg.fetch.timeout_secs == 0 {
            cfg.fetch.timeout_secs = default_fetch_timeout();
        }
        Ok(cfg)
    }

    /// 1) $LIMNOPAPERS_CONFIG (must exist)
    /// 2) config/limnopapers.toml
    /// 3) built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            return Self::load_from_file(&pb);
        }
        let fallback = Path::new(DEFAULT_CONFIG_PATH);
        if fallback.exists() {
            return Self::load_from_file(fallback);
        }
        Ok(Self::default())
    }

    pub fn window_selector(&self, offset: FixedOffset) -> WindowSelector {
        let hours = |h: f64| Duration::seconds((h * 3600.0).round() as i64);
        WindowSelector::new(hours(self.window.before_hours), hours(self.window.after_hours))
            .with_anchor_time(self.window.anchor_time)
            .with_offset(offset)
    }
}
