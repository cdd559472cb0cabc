// src/ingest/types.rs
use anyhow::Result;
use chrono::{DateTime, Utc};

/// One ingested paper announcement. Immutable once built by a provider.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct Post {
    pub title: String,
    pub summary: String,
    #[serde(rename = "prism_url")]
    pub url: String,
    #[serde(rename = "dc_source")]
    pub source: String, // journal display name
    #[serde(rename = "updated")]
    pub published: DateTime<Utc>,
}

#[async_trait::async_trait]
pub trait FeedProvider {
    async fn fetch_posts(&self) -> Result<Vec<Post>>;
    fn name(&self) -> &str;
}
