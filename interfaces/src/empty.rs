use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use async_trait::async_trait;

use crate::defs::Publisher;

/// Publisher that posts nothing. Every call succeeds with a synthetic post id
/// and the rendered post is kept so a dry run can show what would have gone out.
#[derive(Default)]
pub struct DryRunPublisher {
    counter: AtomicUsize,
    posts: Mutex<Vec<(String, String)>>,
}

impl DryRunPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Titles and bodies received so far, oldest first.
    pub fn posts(&self) -> Vec<(String, String)> {
        match self.posts.lock() {
            Ok(posts) => posts.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl Publisher for DryRunPublisher {
    async fn publish(&self, title: &str, body: &str) -> Result<String> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        match self.posts.lock() {
            Ok(mut posts) => posts.push((title.to_owned(), body.to_owned())),
            Err(poisoned) => poisoned.into_inner().push((title.to_owned(), body.to_owned())),
        }
        Ok(format!("dry-run-{n}"))
    }
}
