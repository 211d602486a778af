use anyhow::Result;
use async_trait::async_trait;

/// Addresses one JSON document inside a document store: the container id
/// (a gist id for the GitHub-backed store) and the file name within it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DocumentKey {
    pub id: String,
    pub file_name: String,
}

impl DocumentKey {
    pub fn new(id: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            file_name: file_name.into(),
        }
    }
}

impl std::fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.id, self.file_name)
    }
}

/// What a content extractor pulls out of an article page.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExtractedPage {
    pub text: String,
    pub title: String,
    pub meta_description: String,
}

/// One chunk handed to an abstractive summarizer, with its length bounds and
/// quality knobs. Bounds are in output tokens for model-backed summarizers and
/// in words for extractive ones.
#[derive(Clone, Debug)]
pub struct ChunkRequest<'a> {
    pub text: &'a str,
    pub min_len: usize,
    pub max_len: usize,
    pub num_beams: u32,
    pub length_penalty: f32,
}

// Object style note:
// Implementations are driven by one short-lived batch process and are called
// strictly one at a time. They hold connection settings, not pipeline state;
// the pipeline owns the article store and decides when anything is persisted.

/// Key-value JSON document store. No transactions: a write replaces the
/// whole document.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn read(&self, key: &DocumentKey) -> Result<String>;
    async fn write(&self, key: &DocumentKey, content: &str) -> Result<()>;
}

/// Fetches raw feed bytes (RSS or Atom XML).
#[async_trait]
pub trait FeedFetch: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Fetches an article page and strips it down to its readable text.
#[async_trait]
pub trait ContentExtractor: Send + Sync {
    async fn extract(&self, url: &str) -> Result<ExtractedPage>;
}

/// Summarizes a single chunk of text.
#[async_trait]
pub trait ChunkSummarizer: Send + Sync {
    fn name(&self) -> String;
    async fn summarize_chunk(&self, request: &ChunkRequest<'_>) -> Result<String>;
}

/// Publishes a post to the discussion platform and returns its identifier.
/// Any platform-reported failure is an error.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, title: &str, body: &str) -> Result<String>;
}
