use std::sync::Arc;

use chrono::{DateTime, Utc};
use interfaces::{DocumentKey, DocumentStore};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::store::to_pretty_json;
use crate::types::{RelayError, Result, TrackedSource};

/// On-disk layout of the tracker document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerShape {
    /// `[{blog_name, rss_url, last_fetched}, ...]`
    PerSource,
    /// `{last_fetched, blogs: [{blog_name, rss_url}, ...]}`
    Global,
}

#[derive(Debug, Deserialize, Serialize)]
struct GlobalDocument {
    #[serde(
        default,
        with = "crate::dates::watermark",
        skip_serializing_if = "Option::is_none"
    )]
    last_fetched: Option<DateTime<Utc>>,
    blogs: Vec<TrackedSource>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// Tracked sources and their watermarks. Written back in the shape it was
/// read in.
#[derive(Debug, Clone, PartialEq)]
pub struct Tracker {
    shape: TrackerShape,
    sources: Vec<TrackedSource>,
    extra: Map<String, Value>,
}

impl Tracker {
    pub fn new(sources: Vec<TrackedSource>) -> Self {
        Self {
            shape: TrackerShape::PerSource,
            sources,
            extra: Map::new(),
        }
    }

    pub fn load(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::new(Vec::new()));
        }

        let value: Value = serde_json::from_str(raw)?;
        if value.is_array() {
            let sources: Vec<TrackedSource> = serde_json::from_value(value)?;
            return Ok(Self::new(sources));
        }

        let document: GlobalDocument = serde_json::from_value(value)?;
        let sources = document
            .blogs
            .into_iter()
            .map(|mut source| {
                source.last_fetched = source.last_fetched.or(document.last_fetched);
                source
            })
            .collect();

        Ok(Self {
            shape: TrackerShape::Global,
            sources,
            extra: document.extra,
        })
    }

    pub fn shape(&self) -> TrackerShape {
        self.shape
    }

    pub fn sources(&self) -> &[TrackedSource] {
        &self.sources
    }

    pub fn watermark(&self, rss_url: &str) -> Option<DateTime<Utc>> {
        self.sources
            .iter()
            .find(|source| source.rss_url == rss_url)
            .and_then(|source| source.last_fetched)
    }

    /// Move a source's watermark to `candidate` if that is later. Returns
    /// whether anything changed.
    pub fn advance(&mut self, rss_url: &str, candidate: DateTime<Utc>) -> bool {
        let mut advanced = false;
        for source in self.sources.iter_mut().filter(|source| source.rss_url == rss_url) {
            if source.last_fetched.map_or(true, |current| candidate > current) {
                debug!("Watermark for {} moves to {}", source.blog_name, candidate);
                source.last_fetched = Some(candidate);
                advanced = true;
            }
        }
        advanced
    }

    /// The single watermark of a global document: the earliest per-source
    /// watermark, so no source can skip entries it has not seen.
    pub fn global_watermark(&self) -> Option<DateTime<Utc>> {
        self.sources.iter().filter_map(|source| source.last_fetched).min()
    }

    pub fn serialize(&self) -> Result<String> {
        match self.shape {
            TrackerShape::PerSource => to_pretty_json(&self.sources),
            TrackerShape::Global => {
                let document = GlobalDocument {
                    last_fetched: self.global_watermark(),
                    blogs: self
                        .sources
                        .iter()
                        .cloned()
                        .map(|mut source| {
                            source.last_fetched = None;
                            source
                        })
                        .collect(),
                    extra: self.extra.clone(),
                };
                to_pretty_json(&document)
            }
        }
    }
}

/// A [`Tracker`] bound to its document.
pub struct TrackerRepository {
    documents: Arc<dyn DocumentStore>,
    key: DocumentKey,
}

impl TrackerRepository {
    pub fn new(documents: Arc<dyn DocumentStore>, key: DocumentKey) -> Self {
        Self { documents, key }
    }

    pub async fn fetch(&self) -> Result<Tracker> {
        let raw = self
            .documents
            .read(&self.key)
            .await
            .map_err(|e| RelayError::StoreUnavailable(format!("{}: {}", self.key, e)))?;
        let tracker = Tracker::load(&raw)?;
        info!("Loaded {} tracked sources from {}", tracker.sources().len(), self.key);
        Ok(tracker)
    }

    pub async fn persist(&self, tracker: &Tracker) -> Result<()> {
        let raw = tracker.serialize()?;
        self.documents.write(&self.key, &raw).await?;
        info!("Persisted tracker {}", self.key);
        Ok(())
    }
}
