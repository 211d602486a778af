use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use interfaces::{DocumentKey, DocumentStore};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::types::{Article, RelayError, Result, SelectionPolicy};

/// The persisted article list. Order is insertion order and is never
/// re-sorted; `url` is unique.
///
/// Stored records that do not read as articles (an unknown date format, a
/// missing title) are held as they were read and written back in place. Their
/// urls still count as known, so a feed can never re-add them as unposted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArticleStore {
    articles: Vec<Article>,
    index: HashMap<String, usize>,
    /// Each held record with the number of articles stored before it.
    unreadable: Vec<(usize, Value)>,
    unreadable_urls: HashSet<String>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum StoredRecord<'a> {
    Article(&'a Article),
    Unreadable(&'a Value),
}

impl ArticleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a store from its JSON document. A payload that is not a list
    /// gives an empty store together with the format error; blank payloads
    /// are simply empty. A single unreadable record never resets the store.
    pub fn load(raw: &str) -> (Self, Option<RelayError>) {
        if raw.trim().is_empty() {
            return (Self::new(), None);
        }

        match serde_json::from_str::<Vec<Value>>(raw) {
            Ok(records) => {
                let mut store = Self::new();
                for record in records {
                    match serde_json::from_value::<Article>(record.clone()) {
                        Ok(article) => store.insert_loaded(article),
                        Err(e) => store.hold(record, e),
                    }
                }
                (store, None)
            }
            Err(e) => (Self::new(), Some(RelayError::StoreFormat(e.to_string()))),
        }
    }

    fn hold(&mut self, record: Value, error: serde_json::Error) {
        let url = record.get("url").and_then(Value::as_str).map(str::to_string);
        warn!(
            "Stored record {} is not a readable article and is kept as is: {}",
            url.as_deref().unwrap_or("(no url)"),
            error
        );
        if let Some(url) = url {
            self.unreadable_urls.insert(url);
        }
        self.unreadable.push((self.articles.len(), record));
    }

    // A duplicate url in a stored document folds into the first record; a
    // posted flag on either copy wins.
    fn insert_loaded(&mut self, article: Article) {
        match self.index.get(&article.url) {
            Some(&position) => {
                warn!("Duplicate stored article {} folded into the first record", article.url);
                if article.posted {
                    self.articles[position].posted = true;
                }
            }
            None => self.push(article),
        }
    }

    fn push(&mut self, article: Article) {
        self.index.insert(article.url.clone(), self.articles.len());
        self.articles.push(article);
    }

    /// Append articles whose url is not yet known, as unposted. Returns how
    /// many were added.
    pub fn merge(&mut self, new_articles: impl IntoIterator<Item = Article>) -> usize {
        let mut added = 0;
        for mut article in new_articles {
            if self.contains(&article.url) {
                debug!("Skipping known article {}", article.url);
                continue;
            }
            article.posted = false;
            self.push(article);
            added += 1;
        }
        added
    }

    pub fn get(&self, url: &str) -> Option<&Article> {
        self.index.get(url).map(|&position| &self.articles[position])
    }

    /// Whether `url` is known, as an article or as a held record.
    pub fn contains(&self, url: &str) -> bool {
        self.index.contains_key(url) || self.unreadable_urls.contains(url)
    }

    pub fn find_unposted(&self, policy: SelectionPolicy) -> Option<&Article> {
        let mut unposted = self.articles.iter().filter(|article| !article.posted);
        match policy {
            SelectionPolicy::First => unposted.next(),
            SelectionPolicy::Oldest => unposted.min_by(|a, b| {
                a.date_published
                    .cmp(&b.date_published)
                    .then_with(|| a.url.cmp(&b.url))
            }),
        }
    }

    /// Flip the posted flag. False when the url is unknown.
    pub fn mark_posted(&mut self, url: &str) -> bool {
        match self.index.get(url) {
            Some(&position) => {
                self.articles[position].posted = true;
                true
            }
            None => false,
        }
    }

    pub fn serialize(&self) -> Result<String> {
        let mut records = Vec::with_capacity(self.articles.len() + self.unreadable.len());
        let mut held = self.unreadable.iter().peekable();
        for (position, article) in self.articles.iter().enumerate() {
            while let Some((_, record)) = held.next_if(|(before, _)| *before == position) {
                records.push(StoredRecord::Unreadable(record));
            }
            records.push(StoredRecord::Article(article));
        }
        records.extend(held.map(|(_, record)| StoredRecord::Unreadable(record)));
        to_pretty_json(&records)
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Article> {
        self.articles.iter()
    }

    pub fn unposted_count(&self) -> usize {
        self.articles.iter().filter(|article| !article.posted).count()
    }

    pub fn unreadable_count(&self) -> usize {
        self.unreadable.len()
    }
}

/// JSON with four-space indentation, the layout the stored documents use.
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    value.serialize(&mut serializer)?;
    String::from_utf8(buffer).map_err(|e| RelayError::Other(e.into()))
}

/// An [`ArticleStore`] bound to its document.
pub struct ArticleRepository {
    documents: Arc<dyn DocumentStore>,
    key: DocumentKey,
}

impl ArticleRepository {
    pub fn new(documents: Arc<dyn DocumentStore>, key: DocumentKey) -> Self {
        Self { documents, key }
    }

    /// Read and load the store. An unreachable document is
    /// [`RelayError::StoreUnavailable`]; a malformed one is reset with a warning.
    pub async fn fetch(&self) -> Result<ArticleStore> {
        let raw = self
            .documents
            .read(&self.key)
            .await
            .map_err(|e| RelayError::StoreUnavailable(format!("{}: {}", self.key, e)))?;

        let (store, problem) = ArticleStore::load(&raw);
        if let Some(e) = problem {
            warn!("Article store {} reset: {}", self.key, e);
        }
        info!("Loaded {} articles ({} unposted) from {}", store.len(), store.unposted_count(), self.key);
        if store.unreadable_count() > 0 {
            warn!("{} stored records in {} could not be read and are kept as is", store.unreadable_count(), self.key);
        }
        Ok(store)
    }

    pub async fn persist(&self, store: &ArticleStore) -> Result<()> {
        let raw = store.serialize()?;
        self.documents.write(&self.key, &raw).await?;
        info!("Persisted {} articles to {}", store.len(), self.key);
        Ok(())
    }
}
