pub mod class_filter;
pub mod plain_text;

pub use class_filter::ClassFilterCleaner;
pub use plain_text::PlainTextCleaner;

use std::collections::HashMap;
use std::sync::Arc;

use crate::traits::DescriptionCleaner;
use crate::types::TrackedSource;

/// Picks the description cleaner for each tracked source: one registered
/// for its blog name, else class filtering when the source lists
/// `skip_classes`, else the default.
#[derive(Clone)]
pub struct CleanerRegistry {
    default: Arc<dyn DescriptionCleaner>,
    by_blog: HashMap<String, Arc<dyn DescriptionCleaner>>,
}

impl Default for CleanerRegistry {
    fn default() -> Self {
        Self::new(Arc::new(PlainTextCleaner::new()))
    }
}

impl CleanerRegistry {
    pub fn new(default: Arc<dyn DescriptionCleaner>) -> Self {
        Self {
            default,
            by_blog: HashMap::new(),
        }
    }

    pub fn register(mut self, blog_name: impl Into<String>, cleaner: Arc<dyn DescriptionCleaner>) -> Self {
        self.by_blog.insert(blog_name.into(), cleaner);
        self
    }

    pub fn cleaner_for(&self, source: &TrackedSource) -> Arc<dyn DescriptionCleaner> {
        if let Some(cleaner) = self.by_blog.get(&source.blog_name) {
            return cleaner.clone();
        }
        if !source.skip_classes.is_empty() {
            return Arc::new(ClassFilterCleaner::new(source.skip_classes.iter().cloned()));
        }
        self.default.clone()
    }
}
