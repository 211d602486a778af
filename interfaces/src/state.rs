use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use anyhow::{Result, bail};
use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::defs::DocumentKey;
use crate::defs::DocumentStore;

/// Document store held in process memory. Used for local runs and tests;
/// reads and writes can be made to fail to exercise the pipeline's recovery
/// paths.
#[derive(Default)]
pub struct MemoryDocumentStore {
    documents: RwLock<HashMap<DocumentKey, String>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, key: DocumentKey, content: impl Into<String>) -> Self {
        self.documents.get_mut().insert(key, content.into());
        self
    }

    pub async fn insert(&self, key: DocumentKey, content: impl Into<String>) {
        self.documents.write().await.insert(key, content.into());
    }

    pub async fn document(&self, key: &DocumentKey) -> Option<String> {
        self.documents.read().await.get(key).cloned()
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful writes since creation.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn read(&self, key: &DocumentKey) -> Result<String> {
        if self.fail_reads.load(Ordering::SeqCst) {
            bail!("document store unreachable");
        }
        match self.documents.read().await.get(key) {
            Some(content) => Ok(content.clone()),
            None => bail!("document {key} not found"),
        }
    }

    async fn write(&self, key: &DocumentKey, content: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            bail!("write to {key} rejected");
        }
        self.documents.write().await.insert(key.clone(), content.to_owned());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
