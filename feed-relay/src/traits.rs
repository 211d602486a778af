use crate::summary::Summary;
use crate::types::Article;

/// Turns a raw feed description (usually an HTML fragment) into plain text.
pub trait DescriptionCleaner: Send + Sync {
    /// Name used in logs
    fn name(&self) -> String;

    /// Cleaned text, or `None` when nothing readable is left.
    fn clean(&self, raw: &str) -> Option<String>;
}

/// Platform-ready title and body for one article.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPost {
    pub title: String,
    pub body: String,
}

/// Renders an article, and its summary when one was produced, into a post.
pub trait ContentRenderer: Send + Sync {
    fn render(&self, article: &Article, summary: Option<&Summary>) -> RenderedPost;
}
