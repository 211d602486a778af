use std::sync::Arc;

use interfaces::{ChunkSummarizer, ContentExtractor, DocumentStore, FeedFetch, Publisher};
use tracing::{error, info, warn};

use crate::config::RelayConfig;
use crate::ingest::{FeedIngestor, IngestReport};
use crate::publish::{PublishResult, PublishingStateMachine, SummarySource};
use crate::render::PostTemplate;
use crate::sources::CleanerRegistry;
use crate::store::{ArticleRepository, ArticleStore};
use crate::summary::SummaryEngine;
use crate::tracker::{Tracker, TrackerRepository};
use crate::types::Result;

#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub report: IngestReport,
    /// Articles actually added to the store.
    pub added: usize,
    pub watermarks_advanced: usize,
}

/// One batch run: ingest every tracked source, then publish at most one
/// article. Both documents are read before anything is changed.
pub struct Relay {
    articles: ArticleRepository,
    tracker: TrackerRepository,
    ingestor: FeedIngestor,
    publisher: PublishingStateMachine,
    config: RelayConfig,
}

impl Relay {
    pub fn new(
        config: RelayConfig,
        documents: Arc<dyn DocumentStore>,
        fetcher: Arc<dyn FeedFetch>,
        publisher: Arc<dyn Publisher>,
    ) -> Self {
        let renderer = Arc::new(PostTemplate::builtin(config.publish.template, config.publish.footer.clone()));
        Self {
            articles: ArticleRepository::new(documents.clone(), config.articles_key.clone()),
            tracker: TrackerRepository::new(documents, config.tracker_key.clone()),
            ingestor: FeedIngestor::new(fetcher),
            publisher: PublishingStateMachine::new(publisher, renderer, config.publish.policy),
            config,
        }
    }

    pub fn with_cleaners(mut self, cleaners: CleanerRegistry) -> Self {
        self.ingestor = self.ingestor.with_cleaners(cleaners);
        self
    }

    /// Enrich posts with summaries. Ignored unless summaries are switched on
    /// in the publish configuration.
    pub fn with_summaries(mut self, extractor: Arc<dyn ContentExtractor>, summarizer: Arc<dyn ChunkSummarizer>) -> Self {
        if self.config.publish.summarize {
            info!("Summaries enabled with {}", summarizer.name());
            let engine = SummaryEngine::new(summarizer, self.config.summary.clone());
            self.publisher = self.publisher.with_summaries(SummarySource { extractor, engine });
        }
        self
    }

    pub async fn run_ingest(&self) -> Result<IngestOutcome> {
        let mut tracker = self.tracker.fetch().await?;
        let mut store = self.articles.fetch().await?;
        self.ingest_into(&mut tracker, &mut store).await
    }

    pub async fn run_publish(&self) -> Result<PublishResult> {
        let mut store = self.articles.fetch().await?;
        Ok(self.publish_from(&mut store).await)
    }

    pub async fn run(&self) -> Result<(IngestOutcome, PublishResult)> {
        let mut tracker = self.tracker.fetch().await?;
        let mut store = self.articles.fetch().await?;
        let outcome = self.ingest_into(&mut tracker, &mut store).await?;
        let published = self.publish_from(&mut store).await;
        Ok((outcome, published))
    }

    /// Merge new entries, persist the store, and only then move watermarks.
    async fn ingest_into(&self, tracker: &mut Tracker, store: &mut ArticleStore) -> Result<IngestOutcome> {
        let report = self.ingestor.ingest(tracker.sources()).await;
        let added = store.merge(report.articles.iter().cloned());
        info!("Merged {} of {} ingested articles", added, report.articles.len());

        if added > 0 {
            if let Err(e) = self.articles.persist(store).await {
                error!("Article store not persisted, watermarks left unchanged: {}", e);
                return Err(e);
            }
        }

        let mut watermarks_advanced = 0;
        for source in &report.sources {
            if let Some(candidate) = source.candidate_watermark {
                if tracker.advance(&source.rss_url, candidate) {
                    watermarks_advanced += 1;
                }
            }
        }
        if watermarks_advanced > 0 {
            self.tracker.persist(tracker).await?;
        }

        Ok(IngestOutcome {
            report,
            added,
            watermarks_advanced,
        })
    }

    async fn publish_from(&self, store: &mut ArticleStore) -> PublishResult {
        let result = self.publisher.publish_next(store, &self.articles).await;
        match &result {
            PublishResult::NoCandidate => info!("Nothing to publish"),
            PublishResult::Published { article, post_id } => info!("Posted {} as {}", article.url, post_id),
            PublishResult::PublishFailed { url, reason } => warn!("Posting {} failed: {}", url, reason),
            PublishResult::PersistenceAfterPublishFailed { .. } => {}
        }
        result
    }
}
