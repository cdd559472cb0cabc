pub mod status;

use anyhow::Result;

const ENV_API_BASE: &str = "LIMNOPAPERS_API_BASE";
const ENV_ACCESS_TOKEN: &str = "LIMNOPAPERS_ACCESS_TOKEN";

/// Posting credentials, passed explicitly to whoever publishes.
#[derive(Clone)]
pub struct Credentials {
    pub api_base: String,
    pub access_token: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_base", &self.api_base)
            .field("access_token_len", &self.access_token.len())
            .finish()
    }
}

impl Credentials {
    /// `None` unless both variables are set and non-empty.
    pub fn from_env() -> Option<Self> {
        let api_base = std::env::var(ENV_API_BASE).ok()?;
        let access_token = std::env::var(ENV_ACCESS_TOKEN).ok()?;
        if api_base.trim().is_empty() || access_token.trim().is_empty() {
            return None;
        }
        Some(Self {
            api_base: api_base.trim().trim_end_matches('/').to_string(),
            access_token: access_token.trim().to_string(),
        })
    }
}

#[async_trait::async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, status: &str) -> Result<()>;
}

/// Outward-facing text: full title, `.` unless it already ends in `?`,
/// then source and link.
pub fn format_status(title: &str, source: &str, url: &str) -> String {
    let title = title.trim();
    let sep = if title.ends_with('?') { "" } else { "." };
    format!("{title}{sep} {source}. {url}")
}
