use std::sync::Arc;

use chrono::{DateTime, Utc};
use interfaces::FeedFetch;
use tracing::{error, info, warn};

use crate::parser::FeedParser;
use crate::sources::CleanerRegistry;
use crate::types::{Article, RelayError, Result, TrackedSource};

/// What happened to one tracked source during an ingest pass.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceReport {
    pub blog_name: String,
    pub rss_url: String,
    /// Entries in the feed with a link and a usable date.
    pub entries_found: usize,
    /// Entries newer than the watermark.
    pub accepted: usize,
    /// Entries dropped for lacking a link or a usable date.
    pub skipped: usize,
    /// Latest date among accepted entries; the source's next watermark.
    pub candidate_watermark: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl SourceReport {
    fn new(source: &TrackedSource) -> Self {
        Self {
            blog_name: source.blog_name.clone(),
            rss_url: source.rss_url.clone(),
            entries_found: 0,
            accepted: 0,
            skipped: 0,
            candidate_watermark: None,
            error: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    pub articles: Vec<Article>,
    pub sources: Vec<SourceReport>,
}

impl IngestReport {
    pub fn failed_sources(&self) -> usize {
        self.sources.iter().filter(|s| s.error.is_some()).count()
    }
}

/// Fetches every tracked source and returns the entries newer than each
/// source's watermark. Watermarks themselves are never touched here.
pub struct FeedIngestor {
    fetcher: Arc<dyn FeedFetch>,
    cleaners: CleanerRegistry,
}

impl FeedIngestor {
    pub fn new(fetcher: Arc<dyn FeedFetch>) -> Self {
        Self {
            fetcher,
            cleaners: CleanerRegistry::default(),
        }
    }

    pub fn with_cleaners(mut self, cleaners: CleanerRegistry) -> Self {
        self.cleaners = cleaners;
        self
    }

    pub async fn ingest(&self, sources: &[TrackedSource]) -> IngestReport {
        info!("Ingesting {} tracked sources", sources.len());
        let mut report = IngestReport::default();

        for source in sources {
            let mut source_report = SourceReport::new(source);
            match self.ingest_source(source, &mut source_report).await {
                Ok(articles) => report.articles.extend(articles),
                Err(e) => {
                    error!("Failed to ingest {} ({}): {}", source.blog_name, source.rss_url, e);
                    source_report.error = Some(e.to_string());
                }
            }
            report.sources.push(source_report);
        }

        info!(
            "Ingest found {} new articles across {} sources ({} failed)",
            report.articles.len(),
            report.sources.len(),
            report.failed_sources()
        );
        report
    }

    async fn ingest_source(&self, source: &TrackedSource, report: &mut SourceReport) -> Result<Vec<Article>> {
        let content = self
            .fetcher
            .fetch(&source.rss_url)
            .await
            .map_err(|e| RelayError::FeedFetch {
                url: source.rss_url.clone(),
                reason: e.to_string(),
            })?;

        let feed = FeedParser::parse_feed(&source.rss_url, &content)?;
        report.entries_found = feed.entries.len();
        report.skipped = feed.skipped;

        let cleaner = self.cleaners.cleaner_for(source);
        let mut articles = Vec::new();

        for entry in feed.entries {
            if source.last_fetched.is_some_and(|watermark| entry.published <= watermark) {
                continue;
            }

            report.candidate_watermark = report.candidate_watermark.max(Some(entry.published));
            let description = entry.description.as_deref().and_then(|raw| cleaner.clean(raw));
            articles.push(
                Article::new(entry.link, entry.title, source.blog_name.clone(), entry.published)
                    .with_description(description),
            );
        }

        report.accepted = articles.len();
        if report.skipped > 0 {
            warn!("{}: skipped {} entries without a link or date", source.blog_name, report.skipped);
        }
        info!(
            "{}: {} of {} entries are newer than {:?}",
            source.blog_name, report.accepted, report.entries_found, source.last_fetched
        );
        Ok(articles)
    }
}
