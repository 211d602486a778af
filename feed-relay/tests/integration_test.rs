mod common;

use std::sync::Arc;

use common::*;
use feed_relay::dates;
use feed_relay::{ArticleStore, PublishResult, Relay, RelayError, SelectionPolicy, Tracker, TrackerShape};
use interfaces::{DryRunPublisher, MemoryDocumentStore, Publisher};

const DUNGEON_TRACKER: &str = r#"[
    {"blog_name": "Dungeon Blog", "rss_url": "https://dungeon.example/feed", "last_fetched": "2023-08-05"}
]"#;

const STORED_ARTICLES: &str = r#"[
    {
        "url": "https://dungeon.example/posted",
        "title": "Already Out",
        "blog_name": "Dungeon Blog",
        "date_published": "2023-07-01T00:00:00Z",
        "posted": true
    },
    {
        "url": "https://dungeon.example/newer",
        "title": "Newer Post",
        "blog_name": "Dungeon Blog",
        "date_published": "2023-07-20T00:00:00Z",
        "posted": false
    },
    {
        "url": "https://dungeon.example/older",
        "title": "Older Post",
        "blog_name": "Dungeon Blog",
        "date_published": "2023-07-10T00:00:00Z",
        "posted": false,
        "shared_by": "editor"
    }
]"#;

fn relay(documents: Arc<MemoryDocumentStore>, publisher: Arc<dyn Publisher>) -> Relay {
    Relay::new(relay_config(), documents, standard_feeds(), publisher)
}

async fn stored_articles(documents: &MemoryDocumentStore) -> ArticleStore {
    let raw = documents.document(&articles_key()).await.unwrap();
    let (store, problem) = ArticleStore::load(&raw);
    assert!(problem.is_none());
    store
}

async fn stored_tracker(documents: &MemoryDocumentStore) -> Tracker {
    let raw = documents.document(&tracker_key()).await.unwrap();
    Tracker::load(&raw).unwrap()
}

#[tokio::test]
async fn ingest_stores_new_articles_and_advances_the_watermark() {
    init_tracing();
    let documents = documents(DUNGEON_TRACKER, "[]");
    let relay = relay(documents.clone(), Arc::new(DryRunPublisher::new()));

    let outcome = relay.run_ingest().await.unwrap();

    assert_eq!(outcome.added, 2);
    assert_eq!(outcome.watermarks_advanced, 1);

    let store = stored_articles(&documents).await;
    assert_eq!(store.len(), 2);
    assert_eq!(store.unposted_count(), 2);
    assert!(store.contains("https://dungeon.example/ten-traps"));
    assert!(store.contains("https://dungeon.example/mimics"));

    let tracker = stored_tracker(&documents).await;
    assert_eq!(
        tracker.watermark(DUNGEON_FEED),
        Some(dates::parse("2023-08-15T18:30:00Z").unwrap())
    );
    let raw_tracker = documents.document(&tracker_key()).await.unwrap();
    assert!(raw_tracker.contains(r#""last_fetched": "2023-08-15T18:30:00Z""#));
}

#[tokio::test]
async fn a_second_ingest_changes_nothing() {
    let documents = documents(DUNGEON_TRACKER, "[]");
    let relay = relay(documents.clone(), Arc::new(DryRunPublisher::new()));

    relay.run_ingest().await.unwrap();
    assert_eq!(documents.write_count(), 2);
    let articles_after_first = documents.document(&articles_key()).await;

    let outcome = relay.run_ingest().await.unwrap();

    assert_eq!(outcome.added, 0);
    assert_eq!(outcome.watermarks_advanced, 0);
    assert_eq!(documents.write_count(), 2);
    assert_eq!(documents.document(&articles_key()).await, articles_after_first);
}

#[tokio::test]
async fn watermark_stays_put_when_articles_cannot_be_saved() {
    let documents = documents(DUNGEON_TRACKER, "[]");
    documents.set_fail_writes(true);
    let relay = relay(documents.clone(), Arc::new(DryRunPublisher::new()));

    let result = relay.run_ingest().await;

    assert!(result.is_err());
    assert_eq!(documents.write_count(), 0);
    assert_eq!(documents.document(&tracker_key()).await.as_deref(), Some(DUNGEON_TRACKER));
    assert_eq!(documents.document(&articles_key()).await.as_deref(), Some("[]"));
}

#[tokio::test]
async fn reingesting_known_urls_keeps_the_stored_records() {
    let tracker = r#"[{"blog_name": "Dungeon Blog", "rss_url": "https://dungeon.example/feed"}]"#;
    let articles = r#"[{
        "url": "https://dungeon.example/mimics",
        "title": "Mimic Variants",
        "blog_name": "Dungeon Blog",
        "date_published": "2023-08-15T18:30:00Z",
        "posted": true
    }]"#;
    let documents = documents(tracker, articles);
    let relay = relay(documents.clone(), Arc::new(DryRunPublisher::new()));

    let outcome = relay.run_ingest().await.unwrap();

    assert_eq!(outcome.report.articles.len(), 3);
    assert_eq!(outcome.added, 2);
    let store = stored_articles(&documents).await;
    let urls: Vec<&str> = store.iter().map(|a| a.url.as_str()).collect();
    assert_eq!(
        urls,
        [
            "https://dungeon.example/mimics",
            "https://dungeon.example/old-traps",
            "https://dungeon.example/ten-traps",
        ]
    );
    assert!(store.get("https://dungeon.example/mimics").unwrap().posted);
}

#[tokio::test]
async fn legacy_dates_survive_an_ingest() {
    let articles = r#"[
        {"url": "https://x/posted", "title": "Posted", "date_published": "Tue, 01 Aug 2023 10:00:00 +0000", "posted": true},
        {"url": "https://x/naive", "title": "Naive", "date_published": "2023-08-02T10:00:00", "posted": true},
        {"url": "https://x/odd", "title": "Odd", "date_published": "sometime in August", "posted": true}
    ]"#;
    let documents = documents(DUNGEON_TRACKER, articles);
    let relay = relay(documents.clone(), Arc::new(DryRunPublisher::new()));

    let outcome = relay.run_ingest().await.unwrap();

    assert_eq!(outcome.added, 2);
    let store = stored_articles(&documents).await;
    assert_eq!(store.len(), 4);
    assert_eq!(store.unreadable_count(), 1);
    assert!(store.get("https://x/posted").unwrap().posted);
    assert!(store.get("https://x/naive").unwrap().posted);
    assert_eq!(store.unposted_count(), 2);

    let raw = documents.document(&articles_key()).await.unwrap();
    assert!(raw.contains(r#""date_published": "sometime in August""#));
    assert!(raw.contains(r#""date_published": "2023-08-02T10:00:00Z""#));
}

#[tokio::test]
async fn unreadable_store_aborts_before_any_fetch() {
    let documents = documents(DUNGEON_TRACKER, "[]");
    documents.set_fail_reads(true);
    let feeds = standard_feeds();
    let relay = Relay::new(relay_config(), documents.clone(), feeds.clone(), Arc::new(DryRunPublisher::new()));

    let result = relay.run().await;

    assert!(result.is_err());
    assert_eq!(feeds.requests(), 0);
    assert_eq!(documents.write_count(), 0);
}

#[tokio::test]
async fn malformed_article_store_is_reset() {
    let documents = documents(DUNGEON_TRACKER, r#"{"not": "a list"}"#);
    let relay = relay(documents.clone(), Arc::new(DryRunPublisher::new()));

    let outcome = relay.run_ingest().await.unwrap();

    assert_eq!(outcome.added, 2);
    assert_eq!(stored_articles(&documents).await.len(), 2);
}

#[tokio::test]
async fn global_tracker_keeps_its_shape() {
    let tracker = r#"{
        "last_fetched": "2023-08-05",
        "blogs": [
            {"blog_name": "Dungeon Blog", "rss_url": "https://dungeon.example/feed"},
            {"blog_name": "Tavern Tales", "rss_url": "https://tavern.example/atom.xml"}
        ]
    }"#;
    let documents = documents(tracker, "[]");
    let relay = relay(documents.clone(), Arc::new(DryRunPublisher::new()));

    let outcome = relay.run_ingest().await.unwrap();

    assert_eq!(outcome.added, 3);
    let tracker = stored_tracker(&documents).await;
    assert_eq!(tracker.shape(), TrackerShape::Global);
    assert_eq!(tracker.sources().len(), 2);
    // The earlier of the two sources' new watermarks.
    assert_eq!(tracker.global_watermark(), Some(dates::parse("2023-08-15T18:30:00Z").unwrap()));
}

#[tokio::test]
async fn global_watermark_waits_for_a_failing_source() {
    let tracker = r#"{
        "last_fetched": "2023-08-05",
        "blogs": [
            {"blog_name": "Dungeon Blog", "rss_url": "https://dungeon.example/feed"},
            {"blog_name": "Gone", "rss_url": "https://gone.example/rss"}
        ]
    }"#;
    let documents = documents(tracker, "[]");
    let relay = relay(documents.clone(), Arc::new(DryRunPublisher::new()));

    let outcome = relay.run_ingest().await.unwrap();

    assert_eq!(outcome.report.failed_sources(), 1);
    let tracker = stored_tracker(&documents).await;
    assert_eq!(tracker.global_watermark(), Some(dates::parse("2023-08-05").unwrap()));
}

#[tokio::test]
async fn publish_posts_the_first_unposted_article() {
    let documents = documents(DUNGEON_TRACKER, STORED_ARTICLES);
    let publisher = Arc::new(DryRunPublisher::new());
    let relay = relay(documents.clone(), publisher.clone());

    let result = relay.run_publish().await.unwrap();

    let (article, post_id) = match result {
        PublishResult::Published { article, post_id } => (article, post_id),
        other => panic!("expected a published article, got {other:?}"),
    };
    assert_eq!(article.url, "https://dungeon.example/newer");
    assert!(article.posted);
    assert_eq!(post_id, "dry-run-1");

    let posts = publisher.posts();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].0, "[Dungeon Blog] Newer Post");
    assert!(posts[0].1.contains("[Newer Post](https://dungeon.example/newer)"));

    let store = stored_articles(&documents).await;
    assert_eq!(store.unposted_count(), 1);
    assert!(store.get("https://dungeon.example/newer").unwrap().posted);
    assert!(!store.get("https://dungeon.example/older").unwrap().posted);
}

#[tokio::test]
async fn oldest_policy_picks_by_date() {
    let documents = documents(DUNGEON_TRACKER, STORED_ARTICLES);
    let mut config = relay_config();
    config.publish.policy = SelectionPolicy::Oldest;
    let relay = Relay::new(config, documents.clone(), standard_feeds(), Arc::new(DryRunPublisher::new()));

    let result = relay.run_publish().await.unwrap();

    assert!(matches!(
        result,
        PublishResult::Published { ref article, .. } if article.url == "https://dungeon.example/older"
    ));
    let raw = documents.document(&articles_key()).await.unwrap();
    assert!(raw.contains(r#""shared_by": "editor""#));
}

#[tokio::test]
async fn failed_publish_leaves_the_article_unposted() {
    let documents = documents(DUNGEON_TRACKER, STORED_ARTICLES);
    let relay = relay(documents.clone(), Arc::new(FailingPublisher));

    let result = relay.run_publish().await.unwrap();

    match &result {
        PublishResult::PublishFailed { url, reason } => {
            assert_eq!(url, "https://dungeon.example/newer");
            assert!(reason.contains("503"));
        }
        other => panic!("expected a publish failure, got {other:?}"),
    }
    assert!(matches!(result.error(), Some(RelayError::PublishFailed(_))));
    assert_eq!(documents.write_count(), 0);
    assert_eq!(stored_articles(&documents).await.unposted_count(), 2);
}

#[tokio::test]
async fn persist_failure_after_publish_is_reported() {
    let documents = documents(DUNGEON_TRACKER, STORED_ARTICLES);
    documents.set_fail_writes(true);
    let relay = relay(documents.clone(), Arc::new(DryRunPublisher::new()));

    let result = relay.run_publish().await.unwrap();

    match &result {
        PublishResult::PersistenceAfterPublishFailed { article, post_id, .. } => {
            assert_eq!(article.url, "https://dungeon.example/newer");
            assert!(article.posted);
            assert_eq!(post_id, "dry-run-1");
        }
        other => panic!("expected a persistence failure, got {other:?}"),
    }
    assert!(matches!(
        result.error(),
        Some(RelayError::PersistenceAfterPublish { ref post_id, .. }) if post_id == "dry-run-1"
    ));
    assert_eq!(documents.document(&articles_key()).await.as_deref(), Some(STORED_ARTICLES));
}

#[tokio::test]
async fn nothing_to_publish() {
    for articles in ["[]", ""] {
        let documents = documents(DUNGEON_TRACKER, articles);
        let publisher = Arc::new(DryRunPublisher::new());
        let relay = relay(documents.clone(), publisher.clone());

        let result = relay.run_publish().await.unwrap();

        assert_eq!(result, PublishResult::NoCandidate);
        assert!(result.error().is_none());
        assert!(publisher.posts().is_empty());
        assert_eq!(documents.write_count(), 0);
    }
}

#[tokio::test]
async fn full_run_ingests_then_publishes_one() {
    let documents = documents(DUNGEON_TRACKER, "[]");
    let publisher = Arc::new(DryRunPublisher::new());
    let relay = relay(documents.clone(), publisher.clone());

    let (outcome, result) = relay.run().await.unwrap();

    assert_eq!(outcome.added, 2);
    assert!(matches!(
        result,
        PublishResult::Published { ref article, .. } if article.url == "https://dungeon.example/ten-traps"
    ));
    assert_eq!(publisher.posts().len(), 1);

    let store = stored_articles(&documents).await;
    assert_eq!(store.len(), 2);
    assert_eq!(store.unposted_count(), 1);
}
