//! Opens accepted paper links for reading (`--browser`).

use anyhow::{Context, Result};
use std::process::{Command, Stdio};

pub trait UrlOpener {
    fn open(&self, url: &str) -> Result<()>;
}

/// Hands the URL to the platform's default opener.
pub struct SystemBrowser;

impl UrlOpener for SystemBrowser {
    fn open(&self, url: &str) -> Result<()> {
        let mut cmd = if cfg!(target_os = "macos") {
            let mut c = Command::new("open");
            c.arg(url);
            c
        } else if cfg!(target_os = "windows") {
            let mut c = Command::new("cmd");
            c.args(["/C", "start", "", url]);
            c
        } else {
            let mut c = Command::new("xdg-open");
            c.arg(url);
            c
        };
        cmd.stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("opening {url}"))?;
        Ok(())
    }
}

/// Opens every URL; failures are logged, never fatal. Returns how many opened.
pub fn open_all<'a>(opener: &dyn UrlOpener, urls: impl IntoIterator<Item = &'a str>) -> usize {
    let mut opened = 0;
    for url in urls {
        match opener.open(url) {
            Ok(()) => opened += 1,
            Err(e) => tracing::warn!(error = ?e, url, "browser open failed"),
        }
    }
    opened
}
