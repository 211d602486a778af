use std::sync::Arc;

use interfaces::{ContentExtractor, Publisher};
use tracing::{error, info, warn};

use crate::store::{ArticleRepository, ArticleStore};
use crate::summary::{Summary, SummaryEngine};
use crate::traits::ContentRenderer;
use crate::types::{Article, RelayError, SelectionPolicy};

/// Outcome of one publish attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum PublishResult {
    NoCandidate,
    PublishFailed { url: String, reason: String },
    Published { article: Article, post_id: String },
    /// The post went out and the article is marked posted in memory, but the
    /// store could not be written back.
    PersistenceAfterPublishFailed { article: Article, post_id: String, reason: String },
}

impl PublishResult {
    /// The same outcome as a [`RelayError`], for failure variants.
    pub fn error(&self) -> Option<RelayError> {
        match self {
            Self::PublishFailed { reason, .. } => Some(RelayError::PublishFailed(reason.clone())),
            Self::PersistenceAfterPublishFailed { post_id, reason, .. } => Some(RelayError::PersistenceAfterPublish {
                post_id: post_id.clone(),
                reason: reason.clone(),
            }),
            _ => None,
        }
    }
}

/// Extraction plus summarization, used to enrich posts when enabled.
pub struct SummarySource {
    pub extractor: Arc<dyn ContentExtractor>,
    pub engine: SummaryEngine,
}

/// Moves one article per call from unposted to posted.
pub struct PublishingStateMachine {
    publisher: Arc<dyn Publisher>,
    renderer: Arc<dyn ContentRenderer>,
    policy: SelectionPolicy,
    summaries: Option<SummarySource>,
}

impl PublishingStateMachine {
    pub fn new(publisher: Arc<dyn Publisher>, renderer: Arc<dyn ContentRenderer>, policy: SelectionPolicy) -> Self {
        Self {
            publisher,
            renderer,
            policy,
            summaries: None,
        }
    }

    pub fn with_summaries(mut self, summaries: SummarySource) -> Self {
        self.summaries = Some(summaries);
        self
    }

    pub async fn publish_next(&self, store: &mut ArticleStore, repository: &ArticleRepository) -> PublishResult {
        let Some(article) = store.find_unposted(self.policy).cloned() else {
            info!("No unposted articles left");
            return PublishResult::NoCandidate;
        };
        info!("Selected {} ({}) for publishing", article.title, article.url);

        let summary = self.summary_for(&article).await;
        let post = self.renderer.render(&article, summary.as_ref());

        let post_id = match self.publisher.publish(&post.title, &post.body).await {
            Ok(post_id) => post_id,
            Err(e) => {
                warn!("Publishing {} failed: {}", article.url, e);
                return PublishResult::PublishFailed {
                    url: article.url,
                    reason: e.to_string(),
                };
            }
        };
        info!("Published {} as {}", article.url, post_id);

        store.mark_posted(&article.url);
        let article = store.get(&article.url).cloned().unwrap_or(article);

        match repository.persist(store).await {
            Ok(()) => PublishResult::Published { article, post_id },
            Err(e) => {
                error!(
                    "Post {} for {} is live but the article store was not persisted: {}",
                    post_id, article.url, e
                );
                PublishResult::PersistenceAfterPublishFailed {
                    article,
                    post_id,
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn summary_for(&self, article: &Article) -> Option<Summary> {
        let summaries = self.summaries.as_ref()?;

        let page = match summaries.extractor.extract(&article.url).await {
            Ok(page) => page,
            Err(e) => {
                warn!("Extracting {} failed, posting without a summary: {}", article.url, e);
                return None;
            }
        };

        match summaries.engine.summarize(&page.text).await {
            Ok(summary) => summary,
            Err(e) => {
                warn!("No summary for {}: {}", article.url, e);
                None
            }
        }
    }
}
