use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One discovered article. `url` is the identity key within a store.
///
/// Fields this crate does not know about are kept in `extra` so that records
/// written by other tools survive a load/persist cycle untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub blog_name: String,
    #[serde(with = "crate::dates::rfc3339")]
    pub date_published: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub posted: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Article {
    pub fn new(
        url: impl Into<String>,
        title: impl Into<String>,
        blog_name: impl Into<String>,
        date_published: DateTime<Utc>,
    ) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            blog_name: blog_name.into(),
            date_published,
            description: None,
            posted: false,
            extra: Map::new(),
        }
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }
}

/// A feed being followed. `last_fetched` is the watermark: entries dated at or
/// before it have already been ingested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedSource {
    pub blog_name: String,
    pub rss_url: String,
    #[serde(
        default,
        with = "crate::dates::watermark",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_fetched: Option<DateTime<Utc>>,
    /// CSS classes whose elements are dropped from entry descriptions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skip_classes: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TrackedSource {
    pub fn new(blog_name: impl Into<String>, rss_url: impl Into<String>) -> Self {
        Self {
            blog_name: blog_name.into(),
            rss_url: rss_url.into(),
            last_fetched: None,
            skip_classes: Vec::new(),
            extra: Map::new(),
        }
    }

    pub fn with_last_fetched(mut self, last_fetched: DateTime<Utc>) -> Self {
        self.last_fetched = Some(last_fetched);
        self
    }
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub retry_delay_seconds: u64,
    pub max_feed_size_mb: usize,
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "feed-relay/0.1".to_string(),
            timeout_seconds: 30,
            max_retries: 3,
            retry_delay_seconds: 5,
            max_feed_size_mb: 10,
            max_redirects: 5,
        }
    }
}

/// Length and quality knobs for the summary engine. None of them change the
/// shape of the algorithm, only the sizes it works with.
#[derive(Debug, Clone)]
pub struct SummaryConfig {
    /// Paragraphs per chunk.
    pub chunk_size: usize,
    /// Chunks are cut to this many whitespace tokens before summarization.
    pub max_input_tokens: usize,
    pub min_length: usize,
    pub max_length: usize,
    pub num_beams: u32,
    pub length_penalty: f32,
    pub max_summary_sentences: usize,
    pub key_points: usize,
    /// Instruction prepended to each chunk, for models that expect one.
    pub prompt_prefix: Option<String>,
    /// Summary sentences starting with one of these are prompt echoes.
    pub artifact_markers: Vec<String>,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            chunk_size: 5,
            max_input_tokens: 1024,
            min_length: 50,
            max_length: 150,
            num_beams: 2,
            length_penalty: 5.0,
            max_summary_sentences: 7,
            key_points: 5,
            prompt_prefix: Some("summarize: ".to_string()),
            artifact_markers: vec!["summarize:".to_string()],
        }
    }
}

/// Which unposted article goes out next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SelectionPolicy {
    /// First unposted article in store order.
    #[default]
    First,
    /// Unposted article with the earliest publication date.
    Oldest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum TemplateKind {
    #[default]
    Link,
    Description,
    Summary,
}

#[derive(Debug, Clone)]
pub struct PublishConfig {
    pub policy: SelectionPolicy,
    pub template: TemplateKind,
    pub community: String,
    pub footer: String,
    /// Extract and summarize the article page before posting.
    pub summarize: bool,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            policy: SelectionPolicy::First,
            template: TemplateKind::Link,
            community: "test".to_string(),
            footer: "I'm a bot. Post feedback, blog inclusion requests, and suggestions to /s/ModBot."
                .to_string(),
            summarize: false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("unparseable date: {raw:?}")]
    DateParse { raw: String },

    #[error("article store is not a list of articles: {0}")]
    StoreFormat(String),

    #[error("failed to fetch feed {url}: {reason}")]
    FeedFetch { url: String, reason: String },

    #[error("failed to parse feed {url}: {reason}")]
    FeedParse { url: String, reason: String },

    #[error("no content to summarize")]
    EmptyContent,

    #[error("publish failed: {0}")]
    PublishFailed(String),

    #[error("published as {post_id} but the article store was not persisted: {reason}")]
    PersistenceAfterPublish { post_id: String, reason: String },

    #[error("document store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, RelayError>;
