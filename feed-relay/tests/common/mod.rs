#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};

use anyhow::{Result, bail};
use async_trait::async_trait;
use feed_relay::RelayConfig;
use interfaces::{
    ChunkRequest, ChunkSummarizer, ContentExtractor, DocumentKey, ExtractedPage, FeedFetch, MemoryDocumentStore,
    Publisher,
};
use tracing_subscriber::EnvFilter;

pub const DUNGEON_FEED: &str = "https://dungeon.example/feed";
pub const TAVERN_FEED: &str = "https://tavern.example/atom.xml";
pub const MISSING_FEED: &str = "https://gone.example/rss";

/// Three entries: one on Aug 1 and two after Aug 5 2023.
pub const DUNGEON_RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
<channel>
<title>Dungeon Blog</title>
<link>https://dungeon.example</link>
<description>Traps and treasure</description>
<item>
<title>Old Trap Roundup</title>
<link>https://dungeon.example/old-traps</link>
<pubDate>Tue, 01 Aug 2023 10:00:00 GMT</pubDate>
<description>Traps from last season.</description>
</item>
<item>
<title>Ten Traps</title>
<link>https://dungeon.example/ten-traps</link>
<pubDate>Thu, 10 Aug 2023 09:00:00 GMT</pubDate>
<description><![CDATA[<p>Ten traps for <b>every</b> table.</p><script>track()</script>]]></description>
</item>
<item>
<title>Mimic Variants</title>
<link>https://dungeon.example/mimics</link>
<pubDate>Tue, 15 Aug 2023 18:30:00 GMT</pubDate>
<description>Chests that bite back.</description>
</item>
</channel>
</rss>"#;

pub const TAVERN_ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
<title>Tavern Tales</title>
<id>urn:tavern</id>
<updated>2023-08-20T08:00:00Z</updated>
<entry>
<title>Running a Tavern</title>
<id>urn:tavern:1</id>
<link rel="alternate" href="https://tavern.example/running-a-tavern"/>
<updated>2023-08-20T08:00:00Z</updated>
<summary>Rumours, brawls and bad ale.</summary>
</entry>
</feed>"#;

pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
            .with_test_writer()
            .try_init();
    });
}

pub fn tracker_key() -> DocumentKey {
    DocumentKey::new("tracker-gist", "rss-tracker.json")
}

pub fn articles_key() -> DocumentKey {
    DocumentKey::new("articles-gist", "article-details.json")
}

pub fn relay_config() -> RelayConfig {
    RelayConfig::new(tracker_key(), articles_key())
}

pub fn documents(tracker: &str, articles: &str) -> Arc<MemoryDocumentStore> {
    Arc::new(
        MemoryDocumentStore::new()
            .with_document(tracker_key(), tracker)
            .with_document(articles_key(), articles),
    )
}

/// Serves fixed feed bodies by url; anything else is a 404.
#[derive(Default)]
pub struct StaticFeeds {
    feeds: HashMap<String, Vec<u8>>,
    requests: AtomicUsize,
}

impl StaticFeeds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_feed(mut self, url: &str, body: &str) -> Self {
        self.feeds.insert(url.to_string(), body.as_bytes().to_vec());
        self
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FeedFetch for StaticFeeds {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        match self.feeds.get(url) {
            Some(body) => Ok(body.clone()),
            None => bail!("HTTP 404 Not Found"),
        }
    }
}

pub fn standard_feeds() -> Arc<StaticFeeds> {
    Arc::new(
        StaticFeeds::new()
            .with_feed(DUNGEON_FEED, DUNGEON_RSS)
            .with_feed(TAVERN_FEED, TAVERN_ATOM),
    )
}

/// Rejects every post the way a platform outage would.
pub struct FailingPublisher;

#[async_trait]
impl Publisher for FailingPublisher {
    async fn publish(&self, _title: &str, _body: &str) -> Result<String> {
        bail!("HTTP 503: service unavailable")
    }
}

/// Returns the scripted replies in turn, wrapping around.
pub struct ScriptedSummarizer {
    replies: Vec<String>,
    calls: AtomicUsize,
}

impl ScriptedSummarizer {
    pub fn new(replies: &[&str]) -> Self {
        Self {
            replies: replies.iter().map(|reply| reply.to_string()).collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChunkSummarizer for ScriptedSummarizer {
    fn name(&self) -> String {
        "scripted".to_string()
    }

    async fn summarize_chunk(&self, _request: &ChunkRequest<'_>) -> Result<String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.replies[call % self.replies.len()].clone())
    }
}

/// Hands back the same page for every url, or fails when built without one.
pub struct FixedPage(pub Option<ExtractedPage>);

#[async_trait]
impl ContentExtractor for FixedPage {
    async fn extract(&self, url: &str) -> Result<ExtractedPage> {
        match &self.0 {
            Some(page) => Ok(page.clone()),
            None => bail!("could not load {url}"),
        }
    }
}

/// Fifteen one-sentence paragraphs about a dragon's hoard.
pub const HOARD_BODY: &str = "The dragon guards a hoard of gold in the mountain.
Adventurers travel to the mountain to find the dragon.
The hoard includes gold coins and ancient weapons.
A wizard warns the adventurers about the dragon.
The mountain path is steep and full of traps.
Gold attracts thieves from every kingdom.
The wizard knows a secret path into the mountain.
Adventurers must defeat goblins along the path.
The dragon sleeps for a hundred years at a time.
Ancient weapons in the hoard can harm the dragon.
The wizard gives the adventurers a map of the mountain.
Thieves have tried to steal gold from the hoard before.
The goblins serve the dragon out of fear.
A hidden door leads to the hoard chamber.
The adventurers return home with gold and stories.";

pub fn hoard_page() -> ExtractedPage {
    ExtractedPage {
        text: HOARD_BODY.to_string(),
        title: "The Hoard".to_string(),
        meta_description: String::new(),
    }
}
